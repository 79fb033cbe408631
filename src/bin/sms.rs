use courier::core::config::{ConfigStore, EnvConfig, S3BlobFetcher};
use courier::core::envelope::{InvocationContext, PubSubEvent};
use courier::report::{ErrorReporter, HttpErrorReporter, NoopReporter};
use courier::sms::{SmsDeps, TwilioClient, notify_sms};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::error;

async fn function_handler(event: LambdaEvent<Value>) -> Result<i32, Error> {
    let env = EnvConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let reporter: Box<dyn ErrorReporter> = match &env.error_report_url {
        Some(url) => Box::new(HttpErrorReporter::new(url.clone(), "notify-sms")),
        None => Box::new(NoopReporter),
    };

    let deps = SmsDeps {
        config: ConfigStore::new(
            Box::new(S3BlobFetcher::from_env().await),
            &env.vars_bucket,
            &env.vars_object,
        ),
        sender: Box::new(TwilioClient::new()),
        reporter,
    };

    let pubsub = PubSubEvent {
        data: event
            .payload
            .get("event")
            .and_then(|e| e.get("data"))
            .or_else(|| event.payload.get("data"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };
    let ctx = InvocationContext::from_payload(&event.payload);

    Ok(notify_sms(&pubsub, &ctx, &deps).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    courier::setup_logging();
    run(service_fn(function_handler)).await
}
