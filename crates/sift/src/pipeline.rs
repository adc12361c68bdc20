//! 🚂 The pipeline: read a page, extract, project, send. Repeat until the source runs dry.
//!
//! ```text
//!   Source ──page──▶ Extract ──entities──▶ Project ──record──▶ Sink
//!                       │                                       │
//!                       └──diagnostics──▶ DiagnosticsChannel ◀──┘ abandoned items
//! ```
//!
//! Strictly sequential. One page is fully handled before the next is read, and the
//! only suspension point that matters is the reducer's backoff sleep. Parallelism is
//! the streaming harness's business: it runs many of us over partitioned input.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::backends::{Delivery, Sink, SinkBackend, Source, SourceBackend};
use crate::diagnostics::DiagnosticsChannel;
use crate::report::RunReport;
use crate::roles::Role;
use crate::transforms::{Extract, Extraction, ExtractorBackend, Project, Projector};

/// 🚂 One run of one role. The sink is generic so tests can bring their own store.
#[derive(Debug)]
pub struct Pipeline<K = SinkBackend> {
    role: Role,
    source: SourceBackend,
    extractor: ExtractorBackend,
    projector: Projector,
    sink: K,
    diagnostics: DiagnosticsChannel,
}

impl<K: Sink + Send> Pipeline<K> {
    pub fn new(
        role: Role,
        source: SourceBackend,
        extractor: ExtractorBackend,
        projector: Projector,
        sink: K,
        diagnostics: DiagnosticsChannel,
    ) -> Self {
        Self {
            role,
            source,
            extractor,
            projector,
            sink,
            diagnostics,
        }
    }

    /// 🚀 Run to exhaustion. Bad records never end the run; broken I/O always does.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("🚂 {} starting", self.role);
        let mut report = RunReport::new(self.role);

        while let Some(page) = self
            .source
            .next_page()
            .await
            .context("💀 The input stream broke mid-read. Nothing after this point was seen.")?
        {
            report.pages_read += 1;
            let Extraction {
                entities,
                diagnostics,
            } = self.extractor.extract(&page);

            for diagnostic in diagnostics {
                debug!("🩺 {diagnostic}");
                self.diagnostics.report(&diagnostic).await?;
                report.diagnostics += 1;
            }

            for entity in entities {
                report.entities_extracted += 1;
                let record = self.projector.project(entity)?;
                match self.sink.send(record).await? {
                    Delivery::Delivered => report.records_delivered += 1,
                    Delivery::Abandoned {
                        item,
                        attempts,
                        last_error,
                    } => {
                        warn!("🪦 gave up on item {item} after {attempts} attempts");
                        self.diagnostics
                            .report(&format!(
                                "abandoned item {item} after {attempts} attempts: {last_error}"
                            ))
                            .await?;
                        report.records_abandoned += 1;
                        report.diagnostics += 1;
                    }
                }
            }
        }

        self.sink.close().await?;
        info!(
            "🏁 {} done: {} pages, {} delivered, {} abandoned, {} diagnostics",
            self.role,
            report.pages_read,
            report.records_delivered,
            report.records_abandoned,
            report.diagnostics
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::MapperConfig;
    use crate::backends::{AttributeStoreSink, InMemorySink, ItemLayout, ReadMode, StreamSource};
    use crate::retry::RetryPolicy;
    use crate::roles::{MapRole, ReduceRole};
    use crate::store::{AttributeSet, AttributeStore, InMemoryAttributeStore, StoreBackend};
    use serde_json::{Value, json};
    use std::io::Cursor;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct Harness {
        pipeline: Pipeline,
        output: InMemorySink,
        diagnostics: Arc<Mutex<Vec<String>>>,
    }

    fn mapper(role: Role, input: &str) -> Result<Harness> {
        let output = InMemorySink::new();
        let (channel, diagnostics) = DiagnosticsChannel::in_memory();
        let config = MapperConfig::default();
        let pipeline = Pipeline::new(
            role,
            SourceBackend::in_memory(input, role.read_mode()),
            ExtractorBackend::from_role(role, &config)?,
            Projector::new(config.escape_mode),
            SinkBackend::InMemory(output.clone()),
            channel,
        );
        Ok(Harness {
            pipeline,
            output,
            diagnostics,
        })
    }

    #[tokio::test]
    async fn the_one_where_map_names_keeps_only_guid_ids() -> Result<()> {
        let role = Role::Map(MapRole::Names);
        let harness = mapper(
            role,
            "Arthur Dent\t/guid/42\nFord\t/en/ford\nlonely\n\nTrillian\t/guid/7\textra\n",
        )?;
        let report = harness.pipeline.run().await?;

        assert_eq!(
            harness.output.lines().await,
            vec!["Arthur Dent\t/guid/42", "Trillian\t/guid/7"]
        );
        assert_eq!(report.pages_read, 5);
        assert_eq!(report.records_delivered, 2);
        assert!(harness.diagnostics.lock().await.is_empty(), "tab mappers skip silently");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_map_counts_passes_pairs_through() -> Result<()> {
        let harness = mapper(Role::Map(MapRole::Counts), "/guid/1\t3\nno-count\n/guid/2\t5\r\n")?;
        harness.pipeline.run().await?;
        assert_eq!(harness.output.lines().await, vec!["/guid/1\t3", "/guid/2\t5"]);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_map_interactions_keys_by_date() -> Result<()> {
        let document = json!({
            "id": "obj-1",
            "interactions": [{
                "interaction": {
                    "author": {
                        "id": 1,
                        "avatar": "a.png",
                        "link": "https://social.example/zaphod",
                        "name": "Zaphod",
                        "username": "z"
                    },
                    "content": "two heads\nare better",
                    "created_at": "Mon Jan 02 2023 10:00:00",
                    "link": "https://social.example/zaphod/1",
                    "schema": { "version": 3 },
                    "source": "web"
                }
            }]
        });
        let harness = mapper(Role::Map(MapRole::Interactions), &format!("{document:#}\n"))?;
        let report = harness.pipeline.run().await?;

        let lines = harness.output.lines().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(report.pages_read, 1);
        let (key, payload) = lines[0]
            .split_once('\t')
            .unwrap_or_default();
        assert_eq!(key, "Jan 02 2023");
        let payload: Value = serde_json::from_str(payload)?;
        assert_eq!(payload["content"]["content"], "two heads\\nare better");
        assert_eq!(payload["content"]["objectId"], "obj-1");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_malformed_json_is_one_diagnostic_and_zero_lines() -> Result<()> {
        let harness = mapper(Role::Map(MapRole::Interactions), "{\"interactions\": [nope\n")?;
        let report = harness.pipeline.run().await?;

        assert!(harness.output.lines().await.is_empty());
        assert_eq!(harness.diagnostics.lock().await.len(), 1);
        assert_eq!(report.diagnostics, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_map_words_tallies_everything() -> Result<()> {
        let harness = mapper(Role::Map(MapRole::Words), "Don't Panic\n")?;
        harness.pipeline.run().await?;
        assert_eq!(
            harness.output.lines().await,
            vec!["LongValueSum:don\t1", "LongValueSum:t\t1", "LongValueSum:panic\t1"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_latin1_line_is_counted_and_the_rest_still_arrive() -> Result<()> {
        let role = Role::Map(MapRole::Words);
        let output = InMemorySink::new();
        let (channel, _diagnostics) = DiagnosticsChannel::in_memory();
        let source = SourceBackend::InMemory(StreamSource::new(
            Cursor::new(b"hello world\ncaf\xe9 latte\ngoodbye moon\n".to_vec()),
            ReadMode::Lines,
            "memory",
        ));
        let pipeline = Pipeline::new(
            role,
            source,
            ExtractorBackend::from_role(role, &MapperConfig::default())?,
            Projector::default(),
            SinkBackend::InMemory(output.clone()),
            channel,
        );

        let report = pipeline.run().await?;
        assert_eq!(report.pages_read, 3);
        assert_eq!(
            output.lines().await,
            vec![
                "LongValueSum:hello\t1",
                "LongValueSum:world\t1",
                "LongValueSum:caf\t1",
                "LongValueSum:latte\t1",
                "LongValueSum:goodbye\t1",
                "LongValueSum:moon\t1",
            ]
        );
        Ok(())
    }

    async fn reducer(
        role: Role,
        input: &str,
        store: InMemoryAttributeStore,
        layout: ItemLayout,
    ) -> Result<(RunReport, Arc<Mutex<Vec<String>>>)> {
        let (channel, diagnostics) = DiagnosticsChannel::in_memory();
        let sink = AttributeStoreSink::new(
            StoreBackend::InMemory(store),
            "FreeBase_Names_Guide",
            layout,
            RetryPolicy::default(),
        )
        .await?;
        let pipeline = Pipeline::new(
            role,
            SourceBackend::in_memory(input, ReadMode::Lines),
            ExtractorBackend::from_role(role, &MapperConfig::default())?,
            Projector::default(),
            SinkBackend::AttributeStore(sink),
            channel,
        );
        Ok((pipeline.run().await?, diagnostics))
    }

    #[tokio::test]
    async fn the_one_where_reduce_counts_upserts_with_a_placeholder_name() -> Result<()> {
        let store = InMemoryAttributeStore::new();
        let layout = ItemLayout::CountWithPlaceholder {
            placeholder: "empty".to_string(),
        };
        let (report, diagnostics) = reducer(
            Role::Reduce(ReduceRole::Counts),
            "/guid/1\t3\n/guid/2\t5\n/guid/1\t4\n",
            store.clone(),
            layout,
        )
        .await?;

        assert_eq!(report.records_delivered, 3);
        assert!(diagnostics.lock().await.is_empty());
        assert_eq!(store.item_count("FreeBase_Names_Guide").await, 2);
        let item = store
            .item("FreeBase_Names_Guide", "/guid/1")
            .await
            .unwrap_or_default();
        assert_eq!(item.get("Count"), Some(&vec!["4".to_string()]));
        assert_eq!(item.get("Name"), Some(&vec!["empty".to_string()]));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_reduce_names_names_the_items() -> Result<()> {
        let store = InMemoryAttributeStore::new();
        reducer(
            Role::Reduce(ReduceRole::Names),
            "Slartibartfast\t/guid/fjords\nnobody\t/en/nobody\n",
            store.clone(),
            ItemLayout::NameById,
        )
        .await?;

        assert_eq!(store.item_count("FreeBase_Names_Guide").await, 1);
        let item = store
            .item("FreeBase_Names_Guide", "/guid/fjords")
            .await
            .unwrap_or_default();
        assert_eq!(item.get("Name"), Some(&vec!["Slartibartfast".to_string()]));
        Ok(())
    }

    /// 🎲 Rejects one particular item forever, accepts everything else.
    #[derive(Debug, Default)]
    struct GrudgeStore {
        inner: InMemoryAttributeStore,
    }

    #[async_trait::async_trait]
    impl AttributeStore for GrudgeStore {
        async fn ensure_domain(&self, domain: &str) -> Result<()> {
            self.inner.ensure_domain(domain).await
        }

        async fn put_attributes(
            &self,
            domain: &str,
            item: &str,
            attributes: &AttributeSet,
        ) -> Result<()> {
            if item == "/guid/cursed" {
                anyhow::bail!("500 this item and I have history");
            }
            self.inner.put_attributes(domain, item, attributes).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn the_one_where_an_abandoned_record_does_not_stop_the_run() -> Result<()> {
        let role = Role::Reduce(ReduceRole::Counts);
        let store = GrudgeStore::default();
        let peek = store.inner.clone();
        let (channel, diagnostics) = DiagnosticsChannel::in_memory();
        let sink = AttributeStoreSink::new(
            store,
            "FreeBase_Names_Guide",
            ItemLayout::CountWithPlaceholder {
                placeholder: "empty".to_string(),
            },
            RetryPolicy::default(),
        )
        .await?;
        let pipeline = Pipeline::new(
            role,
            SourceBackend::in_memory("/guid/cursed\t1\n/guid/fine\t2\n", ReadMode::Lines),
            ExtractorBackend::from_role(role, &MapperConfig::default())?,
            Projector::default(),
            sink,
            channel,
        );

        let started = tokio::time::Instant::now();
        let report = pipeline.run().await?;

        assert_eq!(report.records_abandoned, 1);
        assert_eq!(report.records_delivered, 1);
        assert!(started.elapsed() >= std::time::Duration::from_secs(55));
        assert_eq!(
            *diagnostics.lock().await,
            vec![
                "abandoned item /guid/cursed after 11 attempts: 500 this item and I have history"
                    .to_string()
            ]
        );
        assert!(peek.item("FreeBase_Names_Guide", "/guid/fine").await.is_some());
        Ok(())
    }
}
