use std::{fs::File, io::Read, path::PathBuf};

use csv::StringRecord;
use futures::stream;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

enum Input {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// Row source for NEM12 files.
///
/// Rows are read with a blocking CSV reader on a dedicated thread and handed
/// over through a bounded channel, in file order. Field counts vary per
/// record kind, so the reader runs in flexible mode with no header row. When
/// the consumer drops the stream the reader stops at its next send.
pub struct Nem12FileSource {
    input: Mutex<Option<Input>>,
    channel_capacity: usize,
    delimiter: u8,
}

impl Nem12FileSource {
    pub fn new<P: Into<PathBuf>>(path: P, channel_capacity: usize) -> Self {
        Self::with_input(Input::Path(path.into()), channel_capacity)
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R, channel_capacity: usize) -> Self {
        Self::with_input(Input::Reader(Box::new(reader)), channel_capacity)
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn with_input(input: Input, channel_capacity: usize) -> Self {
        Self {
            input: Mutex::new(Some(input)),
            channel_capacity: channel_capacity.max(1),
            delimiter: b',',
        }
    }
}

type RowSender = mpsc::Sender<Result<Envelope<StringRecord>, PipelineError>>;

fn read_rows(input: Input, delimiter: u8, tx: RowSender) {
    let reader: Box<dyn Read + Send> = match input {
        Input::Reader(reader) => reader,
        Input::Path(path) => match File::open(&path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                let _ = tx.blocking_send(Err(PipelineError::Source(format!(
                    "failed to open NEM12 file {}: {e}",
                    path.display()
                ))));
                return;
            }
        },
    };

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);

    for result in rdr.into_records() {
        let item = result
            .map(|record| {
                let line = record.position().map_or(0, |p| p.line());
                Envelope {
                    payload: record,
                    line,
                }
            })
            .map_err(|e| PipelineError::Source(format!("failed to read NEM12 row: {e}")));
        let failed = item.is_err();

        if tx.blocking_send(item).is_err() {
            tracing::debug!("NEM12 row consumer finished, stopping reader");
            return;
        }
        if failed {
            return;
        }
    }
}

#[async_trait::async_trait]
impl Source<StringRecord> for Nem12FileSource {
    async fn stream(&self) -> EnvelopeStream<StringRecord> {
        let Some(input) = self.input.lock().await.take() else {
            return Box::pin(stream::once(async {
                Err::<Envelope<StringRecord>, _>(PipelineError::Source(
                    "NEM12 source stream already taken; only one consumer supported".to_string(),
                ))
            }));
        };

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let delimiter = self.delimiter;
        tokio::task::spawn_blocking(move || read_rows(input, delimiter, tx));

        Box::pin(ReceiverStream::new(rx))
    }
}
