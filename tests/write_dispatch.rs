// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! End-to-end dispatch scenarios over the public API.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use rss_shuffle::backend::BackendFactory;
use rss_shuffle::client::ShuffleWriteClient;
use rss_shuffle::config::{ShuffleConfig, RSS_ROW_BASED};
use rss_shuffle::dispatch::{ShuffleWriterProvider, WriteDispatcher};
use rss_shuffle::error::{Result, ShuffleError};
use rss_shuffle::handle::{
    ColumnarDependency, RowDependency, RssShuffleHandle, ShuffleDependency,
    ShuffleHandle,
};
use rss_shuffle::metrics::ShuffleWriteMetricsReporter;
use rss_shuffle::registry::LazyBackendRegistry;
use rss_shuffle::task::TaskContext;
use rss_shuffle::writer::{ColumnarShuffleWriter, ShuffleWriter};

#[derive(Debug, Default)]
struct RecordingClient {
    pushes: Mutex<Vec<(String, usize, String, usize, usize)>>,
    finalized: Mutex<Vec<String>>,
    fail_pushes: bool,
}

impl RecordingClient {
    fn failing() -> Self {
        Self {
            fail_pushes: true,
            ..Default::default()
        }
    }
}

impl ShuffleWriteClient for RecordingClient {
    fn push_block(
        &self,
        app_id: &str,
        shuffle_id: usize,
        task_id: &str,
        partition_id: usize,
        data: &[u8],
    ) -> Result<()> {
        if self.fail_pushes {
            return Err(ShuffleError::General(
                "shuffle service unavailable".to_string(),
            ));
        }
        self.pushes.lock().push((
            app_id.to_string(),
            shuffle_id,
            task_id.to_string(),
            partition_id,
            data.len(),
        ));
        Ok(())
    }

    fn finalize_task(
        &self,
        _app_id: &str,
        _shuffle_id: usize,
        task_id: &str,
    ) -> Result<()> {
        self.finalized.lock().push(task_id.to_string());
        Ok(())
    }
}

#[derive(Debug)]
struct DefaultPathWriter;

impl ShuffleWriter for DefaultPathWriter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn write_block(&mut self, _partition_id: usize, _data: &[u8]) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self, _success: bool) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DefaultPath {
    writer_calls: AtomicUsize,
    registered: Mutex<Vec<usize>>,
}

impl ShuffleWriterProvider for DefaultPath {
    fn register_shuffle(
        &self,
        shuffle_id: usize,
        _handle: Arc<dyn ShuffleHandle>,
    ) -> Result<()> {
        self.registered.lock().push(shuffle_id);
        Ok(())
    }

    fn get_writer(
        &self,
        _handle: Arc<dyn ShuffleHandle>,
        _map_id: u64,
        _context: &TaskContext,
        _reporter: Option<Arc<dyn ShuffleWriteMetricsReporter>>,
    ) -> Result<Box<dyn ShuffleWriter>> {
        self.writer_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(DefaultPathWriter))
    }
}

fn dispatcher_with(
    client: Arc<RecordingClient>,
    provider: Arc<DefaultPath>,
) -> (WriteDispatcher, Arc<ShuffleConfig>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = Arc::new(ShuffleConfig::default());
    let registry = Arc::new(LazyBackendRegistry::new(
        BackendFactory::new(),
        Arc::clone(&config),
        false,
    ));
    (
        WriteDispatcher::new(Arc::clone(&config), registry, client, provider),
        config,
    )
}

fn columnar_handle(app_id: &str, shuffle_id: usize) -> Arc<dyn ShuffleHandle> {
    Arc::new(RssShuffleHandle::new(
        app_id,
        shuffle_id,
        ShuffleDependency::Columnar(ColumnarDependency { num_partitions: 8 }),
    ))
}

#[test]
fn columnar_write_request_end_to_end() -> Result<()> {
    let client = Arc::new(RecordingClient::default());
    let provider = Arc::new(DefaultPath::default());
    let (dispatcher, config) =
        dispatcher_with(Arc::clone(&client), Arc::clone(&provider));
    let context = TaskContext::new(42, 0);

    let mut writer =
        dispatcher.get_writer(columnar_handle("app-1", 3), 0, &context, None)?;

    {
        let columnar = writer
            .as_any()
            .downcast_ref::<ColumnarShuffleWriter>()
            .unwrap();
        assert_eq!("42_0", columnar.task_id());
        assert_eq!("app-1", columnar.app_id());
        assert_eq!(3, columnar.shuffle_id());
        assert_eq!(42, columnar.task_attempt_id());
    }

    // the baseline encoding flag was defaulted, not overwritten
    assert_eq!(Some("false".to_string()), config.get(RSS_ROW_BASED));
    assert!(!config.row_based());
    // the pusher identity was registered for this shuffle
    assert_eq!(Some("app-1".to_string()), dispatcher.pusher_app_id(3));

    writer.write_block(1, &[7u8; 64])?;
    writer.stop(true)?;

    let pushes = client.pushes.lock();
    assert_eq!(1, pushes.len());
    assert_eq!(
        ("app-1".to_string(), 3, "42_0".to_string(), 1, 64),
        pushes[0]
    );
    assert_eq!(vec!["42_0".to_string()], client.finalized.lock().clone());

    // no reporter was supplied, so metrics came from the task context
    assert_eq!(
        64,
        context.task_metrics().shuffle_write_metrics().bytes_written()
    );
    assert_eq!(0, provider.writer_calls.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn row_based_write_request_uses_default_path() -> Result<()> {
    let client = Arc::new(RecordingClient::default());
    let provider = Arc::new(DefaultPath::default());
    let (dispatcher, _config) =
        dispatcher_with(Arc::clone(&client), Arc::clone(&provider));
    let context = TaskContext::new(10, 2);

    let handle: Arc<dyn ShuffleHandle> = Arc::new(RssShuffleHandle::new(
        "app-2",
        4,
        ShuffleDependency::RowBased(RowDependency { num_partitions: 8 }),
    ));
    let writer = dispatcher.get_writer(handle, 0, &context, None)?;

    // the returned writer is exactly what the default path produced
    assert!(writer.as_any().downcast_ref::<DefaultPathWriter>().is_some());
    assert_eq!(1, provider.writer_calls.load(Ordering::SeqCst));
    // zero mutation of pusher-identity state
    assert!(dispatcher.pusher_app_id(4).is_none());
    assert!(client.pushes.lock().is_empty());
    Ok(())
}

#[test]
fn registration_is_forwarded_to_default_path() -> Result<()> {
    let client = Arc::new(RecordingClient::default());
    let provider = Arc::new(DefaultPath::default());
    let (dispatcher, _config) =
        dispatcher_with(client, Arc::clone(&provider));

    dispatcher.register_shuffle(11, columnar_handle("app-3", 11))?;
    assert_eq!(vec![11], provider.registered.lock().clone());
    Ok(())
}

#[test]
fn failed_push_marks_task_failed() -> Result<()> {
    let client = Arc::new(RecordingClient::failing());
    let provider = Arc::new(DefaultPath::default());
    let (dispatcher, _config) = dispatcher_with(client, provider);
    let context = TaskContext::new(9, 0);

    let mut writer =
        dispatcher.get_writer(columnar_handle("app-1", 12), 0, &context, None)?;
    let err = writer.write_block(0, &[1u8; 16]).unwrap_err();
    assert!(matches!(err, ShuffleError::General(_)));

    let failure = dispatcher.write_failure(12).expect("failure recorded");
    assert!(failure.contains("shuffle service unavailable"));
    Ok(())
}
