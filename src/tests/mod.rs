mod support;

mod adapter_tests;
