//! Wires two dashboard clients (admin and tenant) around one credential store and one refresh
//! coordinator, then issues concurrent calls that share any renewal they trigger.
//!
//! Point `API_BASE_URL` at a backend that serves `/admin/users`, `/tenant/plans`, and
//! `/auth/refresh`; the demo defaults to `http://127.0.0.1:8080/`.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use bearer_session::{
	auth::{CredentialStore, Credentials},
	client::{ApiClient, ReqwestApiClient},
	config::ClientConfig,
	http::ReqwestHttpClient,
	refresh::{HttpRenewer, RefreshCoordinator},
	session::SessionTerminator,
	store::{KeyValueStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let base_url =
		Url::parse(&env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080/".into()))?;
	let admin_config = ClientConfig::builder(base_url.join("admin/")?)
		.renewal_path(base_url.join("auth/refresh")?.as_str())
		.build()?;
	let tenant_config = ClientConfig::builder(base_url.join("tenant/")?)
		.renewal_path(admin_config.renewal_url().as_str())
		.build()?;
	let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
	let credentials =
		Arc::new(CredentialStore::new(backend, admin_config.credential_keys.clone()));
	let terminator = Arc::new(SessionTerminator::new(
		credentials.clone(),
		Arc::new(|| println!("session ended, routing to /login")),
	));
	let http_client = Arc::new(ReqwestHttpClient::new()?);
	let renewer = Arc::new(HttpRenewer::new(http_client.clone(), admin_config.renewal_url()));
	let coordinator = Arc::new(RefreshCoordinator::new(credentials, renewer, terminator));
	let admin: ReqwestApiClient =
		ApiClient::new(admin_config, http_client.clone(), coordinator.clone());
	let tenant: ReqwestApiClient = ApiClient::new(tenant_config, http_client, coordinator.clone());

	admin.sign_in(&Credentials::new("demo-access").with_refresh_token("demo-refresh"));

	let (users, plans) = tokio::join!(
		admin.get_json::<serde_json::Value>("users"),
		tenant.get_json::<serde_json::Value>("plans"),
	);

	match users {
		Ok(users) => println!("admin users: {users}"),
		Err(e) => println!("admin users failed: {e}"),
	}
	match plans {
		Ok(plans) => println!("tenant plans: {plans}"),
		Err(e) => println!("tenant plans failed: {e}"),
	}

	println!("renewal metrics: {:?}", coordinator.metrics());
	println!("still signed in: {}", admin.is_signed_in());

	Ok(())
}
