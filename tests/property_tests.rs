//! Property-based tests for record identity and chunk ordering
//!
//! - Fingerprints are deterministic and sensitive to every identity field
//! - Stored chunk order matches arrival order
//! - Run with ProptestConfig::with_cases(64)

use std::sync::Arc;

use proptest::prelude::*;
use sysmetrics_store::config::ServiceConfig;
use sysmetrics_store::env::Environment;
use sysmetrics_store::ingest::{IngestionService, MetricsChunk};
use sysmetrics_store::metadata::MetadataStore;
use sysmetrics_store::model::{ArtifactOptions, BucketKind, SystemMetrics, SystemMetricsInfo};
use sysmetrics_store::reader::ArtifactReader;
use sysmetrics_store::ErrorKind;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Strategies
// ============================================================================

fn arb_info() -> impl Strategy<Value = SystemMetricsInfo> {
    (
        "[a-z0-9-]{0,12}",
        "[a-f0-9]{0,12}",
        "[a-z0-9-]{0,12}",
        "[a-zA-Z_]{0,12}",
        "[a-z0-9_]{0,12}",
        0i32..10,
        any::<bool>(),
    )
        .prop_map(|(project, version, variant, task_name, task_id, execution, mainline)| {
            SystemMetricsInfo {
                project,
                version,
                variant,
                task_name,
                task_id,
                execution,
                mainline,
                schema: 0,
            }
        })
}

/// One copy of `info` per hashed field, with only that field changed.
fn variants(info: &SystemMetricsInfo) -> Vec<(&'static str, SystemMetricsInfo)> {
    let base = info.clone();
    vec![
        ("project", SystemMetricsInfo { project: format!("{}x", info.project), ..base.clone() }),
        ("version", SystemMetricsInfo { version: format!("{}x", info.version), ..base.clone() }),
        ("variant", SystemMetricsInfo { variant: format!("{}x", info.variant), ..base.clone() }),
        ("task_name", SystemMetricsInfo { task_name: format!("{}x", info.task_name), ..base.clone() }),
        ("task_id", SystemMetricsInfo { task_id: format!("{}x", info.task_id), ..base.clone() }),
        ("execution", SystemMetricsInfo { execution: info.execution + 10, ..base }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: equal infos give equal IDs
    #[test]
    fn prop_id_deterministic(info in arb_info()) {
        let copy = info.clone();
        prop_assert_eq!(info.id().unwrap(), copy.id().unwrap());
    }

    /// Property: IDs are 40 lower-case hex chars
    #[test]
    fn prop_id_is_hex_digest(info in arb_info()) {
        let id = info.id().unwrap();
        prop_assert_eq!(id.len(), 40);
        prop_assert!(id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    /// Property: mainline never changes the ID
    #[test]
    fn prop_mainline_not_fingerprinted(info in arb_info()) {
        let flipped = SystemMetricsInfo { mainline: !info.mainline, ..info.clone() };
        prop_assert_eq!(info.id().unwrap(), flipped.id().unwrap());
    }

    /// Property: changing any hashed field changes the ID
    #[test]
    fn prop_each_hashed_field_changes_id(info in arb_info()) {
        let id = info.id().unwrap();
        for (field, changed) in variants(&info) {
            prop_assert_ne!(&id, &changed.id().unwrap(), "changing {} kept the ID", field);
        }
    }

    /// Property: every non-zero schema is rejected
    #[test]
    fn prop_unknown_schema_rejected(info in arb_info(), schema in 1i32..1000) {
        let versioned = SystemMetricsInfo { schema, ..info };
        prop_assert_eq!(versioned.id().unwrap_err().kind(), ErrorKind::UnsupportedSchema);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: streamed chunks read back in arrival order
    #[test]
    fn prop_stream_order_preserved(payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..20)) {
        let stored = runtime().block_on(async {
            let env = Arc::new(Environment::in_memory(ServiceConfig::with_system_metrics_bucket("mem")));
            let record = SystemMetrics::new(
                SystemMetricsInfo { project: "prop".into(), ..Default::default() },
                ArtifactOptions { kind: BucketKind::InMemory, ..Default::default() },
            )
            .unwrap();
            env.metadata().save(&record).await.unwrap();

            let chunks = payloads
                .iter()
                .map(|p| Ok(MetricsChunk::new(record.id(), p.clone())))
                .collect::<Vec<_>>();
            IngestionService::new(Arc::clone(&env))
                .stream_system_metrics(tokio_stream::iter(chunks), &CancellationToken::new())
                .await
                .unwrap();

            ArtifactReader::new(env).read_chunks(record.id()).await.unwrap().1
        });

        prop_assert_eq!(stored, payloads);
    }
}
