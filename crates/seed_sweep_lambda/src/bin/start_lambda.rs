use aws_sdk_lambda::types::InvocationType;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use seed_sweep_core::config::StartConfig;
use seed_sweep_core::seed_space::SeedSpaceModel;
use seed_sweep_lambda::adapters::invoke::DispatchInvoker;
use seed_sweep_lambda::handlers::start::{handle_start_event, ApiGatewayResponse};
use seed_sweep_lambda::logging::init_logging;
use serde_json::Value;

struct AwsLambdaDispatchInvoker {
    lambda_client: aws_sdk_lambda::Client,
    function_name: String,
}

impl DispatchInvoker for AwsLambdaDispatchInvoker {
    fn invoke_dispatch_async(&self, payload: &[u8]) -> Result<(), String> {
        let request_payload = payload.to_vec();
        let client = self.lambda_client.clone();
        let function_name = self.function_name.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .invoke()
                    .function_name(function_name)
                    .invocation_type(InvocationType::Event)
                    .set_payload(Some(request_payload.into()))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to invoke dispatch lambda: {error}"))
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    seed_space: &SeedSpaceModel,
    config: &StartConfig,
) -> Result<ApiGatewayResponse, Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let invoker = AwsLambdaDispatchInvoker {
        lambda_client: aws_sdk_lambda::Client::new(&aws_config),
        function_name: config.dispatch_function.clone(),
    };

    Ok(handle_start_event(event.payload, seed_space, &invoker))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();
    let seed_space = SeedSpaceModel::default();
    let config = StartConfig::from_env();
    let seed_space = &seed_space;
    let config = &config;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, seed_space, config).await
    }))
    .await
}
