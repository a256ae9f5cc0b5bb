use api_serverless_lambda::{entrypoint, platform};
use lambda_http::{service_fn, Error, Request, RequestExt as _};

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let handler = entrypoint::handler()?;

    lambda_http::run(service_fn(move |request: Request| async move {
        tracing::debug!(
            component = "api_lambda",
            event = "invocation_received",
            request_id = request.lambda_context_ref().map(|context| context.request_id.as_str()),
        );
        platform::handle_request(handler, request)
            .await
            .map_err(Error::from)
    }))
    .await
}
