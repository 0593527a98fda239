//! Source adapters against scripted upstream responses, across the whole catalog.

#[cfg(test)]
mod tests {
    use crate::{
        catalog::{self, CoinMeta, HashrateSource, Provider, COINS},
        config::Credentials,
        sources::{minerstat, nownodes, SourceError},
        tests::support::{blockbook_body, minerstat_coins_body, ScriptedTransport},
    };
    use serde_json::{json, Value};

    const DIFFICULTY: f64 = 1.0e12;
    const REPORTED: f64 = 5.0e14;

    fn credentials() -> Credentials {
        Credentials {
            nownodes_api_key: Some("k".to_string()),
            minerstat_api_key: Some("m".to_string()),
        }
    }

    fn provider_body(meta: &CoinMeta) -> Value {
        match meta.provider {
            Provider::Blockbook { .. } => blockbook_body(DIFFICULTY, 870_000),
            Provider::KaspaRest => {
                json!({ "difficulty": DIFFICULTY, "hashrate": REPORTED, "blockCount": "100000" })
            }
            Provider::MoneroRpc => {
                json!({ "jsonrpc": "2.0", "id": "0", "result": { "difficulty": DIFFICULTY, "height": 3_200_000 } })
            }
            Provider::DigibyteRpc => json!({
                "result": {
                    "blocks": 20_000_000,
                    "difficulties": { "sha256d": DIFFICULTY, "scrypt": 1.0 },
                    "networkhashesps": { "sha256d": REPORTED, "scrypt": 1.0 }
                },
                "error": null
            }),
        }
    }

    #[tokio::test]
    async fn every_coin_reports_hashrate_according_to_its_source() {
        for meta in COINS {
            let transport = ScriptedTransport::new();
            let url = nownodes::build_request(meta, "k").url;
            transport.respond(&url, provider_body(meta));

            let stat = nownodes::fetch_coin_stat(transport.as_ref(), &credentials(), meta.symbol)
                .await
                .unwrap_or_else(|e| panic!("{} failed: {}", meta.symbol, e));

            assert_eq!(stat.coin, meta.symbol);
            assert_eq!(stat.difficulty, DIFFICULTY, "{}", meta.symbol);
            assert_eq!(stat.block_time, meta.block_time);
            assert_eq!(stat.block_reward, meta.block_reward);
            assert!(stat.height > 0, "{} height", meta.symbol);

            match meta.hashrate {
                HashrateSource::Estimated(formula) => {
                    assert!(stat.hashrate_estimated, "{}", meta.symbol);
                    assert_eq!(stat.hashrate_formula, Some(formula));
                    assert_eq!(stat.network_hashrate, formula.estimate(DIFFICULTY, meta.block_time));
                }
                HashrateSource::Reported => {
                    assert!(!stat.hashrate_estimated, "{}", meta.symbol);
                    assert_eq!(stat.network_hashrate, REPORTED);
                }
                HashrateSource::Unavailable => {
                    assert!(!stat.hashrate_estimated, "{}", meta.symbol);
                    assert_eq!(stat.network_hashrate, 0.0);
                    assert_eq!(stat.hashrate_formula, None);
                }
            }
            assert_eq!(transport.total_calls(), 1);
        }
    }

    #[tokio::test]
    async fn serialized_stat_marks_estimates() {
        let transport = ScriptedTransport::new();
        transport.respond("btcbook", blockbook_body(DIFFICULTY, 1));
        let stat = nownodes::fetch_coin_stat(transport.as_ref(), &credentials(), "BTC")
            .await
            .unwrap();

        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["hashrate_estimated"], json!(true));
        assert!(value.get("hashrate_formula").is_some());

        transport.respond("etcbook", blockbook_body(DIFFICULTY, 1));
        let stat = nownodes::fetch_coin_stat(transport.as_ref(), &credentials(), "ETC")
            .await
            .unwrap();
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["hashrate_estimated"], json!(false));
        assert_eq!(value["network_hashrate"], json!(0.0));
        assert!(value.get("hashrate_formula").is_none());
    }

    #[tokio::test]
    async fn missing_credential_makes_no_request() {
        let transport = ScriptedTransport::new();
        for symbol in catalog::symbols() {
            let err = nownodes::fetch_coin_stat(transport.as_ref(), &Credentials::default(), symbol)
                .await
                .unwrap_err();
            assert_eq!(err, SourceError::MissingCredential(nownodes::API_KEY_VAR));
        }

        let err = minerstat::fetch_coins(transport.as_ref(), &Credentials::default())
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::MissingCredential(minerstat::API_KEY_VAR));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_coin_is_rejected_before_any_request() {
        let transport = ScriptedTransport::new();
        let err = nownodes::fetch_coin_stat(transport.as_ref(), &credentials(), "FOO")
            .await
            .unwrap_err();

        assert_eq!(err, SourceError::UnsupportedCoin("FOO".to_string()));
        assert_eq!(err.code(), "unsupported_coin");
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_as_upstream_error() {
        let transport = ScriptedTransport::new();
        transport.fail("ltcbook", "timed out");
        let err = nownodes::fetch_coin_stat(transport.as_ref(), &credentials(), "LTC")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "upstream_error");
    }

    #[tokio::test]
    async fn malformed_payload_is_an_upstream_error() {
        let transport = ScriptedTransport::new();
        transport.respond("dogebook", json!({ "backend": { "blocks": 5 } }));
        let err = nownodes::fetch_coin_stat(transport.as_ref(), &credentials(), "DOGE")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "upstream_error");
    }

    #[tokio::test]
    async fn minerstat_coins_keep_matching_algorithms_only() {
        let transport = ScriptedTransport::new();
        transport.respond("/v2/coins", minerstat_coins_body());

        let fetched = minerstat::fetch_coins(transport.as_ref(), &credentials())
            .await
            .unwrap();

        assert_eq!(fetched.raw_entries, 5);
        assert_eq!(
            fetched.coins.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["DGB", "XMR", "ZEC"]
        );
        assert_eq!(fetched.coins["DGB"].algorithm, "Scrypt");
        assert_eq!(transport.calls_to("list="), 1);
    }
}
