use async_trait::async_trait;
use clap::Parser;
use queue_consume::impls::sqs::MessageClientImplSqs;
use queue_consume::{
    CommandError, ConsumeCommand, ConsumptionOptions, LogMetricPublisher, LogicalQueue, Message,
    MessageClientError, MessageConsumer, MessageConsumptionError, MessageConsumptionOutcome,
    PrefixQueueNameResolver, Worker,
};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

/// Consumes messages from a queue and writes their bodies to stdout, one per line.
#[derive(Debug, Parser)]
#[command(name = "queue-consume", version)]
struct Args {
    /// Name of the queue that will be consumed.
    #[arg(value_enum)]
    queue: LogicalQueue,

    /// Max time in seconds for the consumer to run.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    max_runtime: Option<i64>,

    /// Max number of messages to consume.
    #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
    max_consumed_messages: Option<i64>,

    /// Stop the consumer as soon as the queue is empty.
    #[arg(long)]
    consume_until_queue_empty: bool,

    /// Prefix turning a logical queue name into the physical one.
    #[arg(long, env = "QUEUE_NAME_PREFIX", default_value = "")]
    queue_prefix: String,

    /// Physical name of the queue receiving unprocessable messages.
    #[arg(long, env = "DEAD_LETTER_QUEUE")]
    dead_letter_queue: Option<String>,
}

impl Args {
    fn options(&self) -> ConsumptionOptions {
        ConsumptionOptions {
            queue: self.queue.to_string(),
            max_runtime_secs: self.max_runtime,
            max_consumed_messages: self.max_consumed_messages,
            consume_until_empty: self.consume_until_queue_empty,
        }
    }
}

struct StdoutConsumer;

#[async_trait]
impl MessageConsumer for StdoutConsumer {
    async fn consume(
        &self,
        message: &Message,
    ) -> Result<MessageConsumptionOutcome, MessageConsumptionError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", message.content())
            .and_then(|_| stdout.flush())
            .map_err(|e| MessageConsumptionError::Transient(e.to_string()))?;
        Ok(MessageConsumptionOutcome::Succeeded)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let command = ConsumeCommand::new(
        Arc::new(PrefixQueueNameResolver::new(args.queue_prefix.clone())),
        Arc::new(LogMetricPublisher),
    );
    let dead_letter_queue = args.dead_letter_queue.clone();

    let res = command
        .execute(args.options(), |resolved| async move {
            let client = MessageClientImplSqs::init(&resolved, dead_letter_queue.as_deref()).await?;
            let worker = Worker::new(Arc::new(client), Arc::new(StdoutConsumer));

            let cancellation = worker.cancellation();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("Received interrupt, stopping after the current message.");
                    cancellation.cancel();
                }
            });

            Ok::<_, MessageClientError>(worker)
        })
        .await;

    match res {
        Ok(_) => ExitCode::SUCCESS,
        Err(e @ CommandError::Consumption(_)) => {
            log::error!("{e}");
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
