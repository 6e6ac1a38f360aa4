use aws_config::BehaviorVersion;
use aws_config::environment::region::EnvironmentVariableRegionProvider;
use aws_config::meta::region::RegionProviderChain;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::config::Region;

const DEFAULT_REGION: &str = "us-east-1";

/// Client for a local DynamoDB at `endpoint_url`. Credentials are the static
/// `local`/`local` pair DynamoDB Local accepts; the region comes from
/// `AWS_REGION`/`AWS_DEFAULT_REGION` when set.
pub async fn new_client(endpoint_url: &str) -> aws_sdk_dynamodb::Client {
    let region = RegionProviderChain::first_try(EnvironmentVariableRegionProvider::new())
        .or_else(Region::new(DEFAULT_REGION));
    let credentials = Credentials::from_keys("local", "local", None);

    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(credentials)
        .endpoint_url(endpoint_url)
        .load()
        .await;
    tracing::debug!(endpoint = endpoint_url, "created DynamoDB client");
    aws_sdk_dynamodb::Client::new(&config)
}
