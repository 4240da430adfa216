//! Authenticated request pipeline for REST API clients: bearer credentials on every call,
//! single-flight token renewal across concurrent callers, one bounded retry per call, and
//! forced sign-out when renewal fails.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod retry;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{CredentialStore, Credentials},
		client::ApiClient,
		config::ClientConfig,
		http::ReqwestHttpClient,
		refresh::{HttpRenewer, RefreshCoordinator},
		session::{Navigator, SessionTerminator},
		store::{KeyValueStore, MemoryStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = ApiClient<ReqwestHttpClient>;

	/// Navigator that counts how many times it was asked to leave the authenticated area.
	#[derive(Debug, Default)]
	pub struct CountingNavigator(AtomicUsize);
	impl CountingNavigator {
		/// Returns the number of recorded `go_to_login` calls.
		pub fn visits(&self) -> usize {
			self.0.load(Ordering::SeqCst)
		}
	}
	impl Navigator for CountingNavigator {
		fn go_to_login(&self) {
			self.0.fetch_add(1, Ordering::SeqCst);
		}
	}

	/// Everything a test needs to drive and inspect a reqwest-backed client.
	pub struct TestHarness {
		/// Client under test.
		pub client: ReqwestTestClient,
		/// Raw key-value backend shared with the credential store.
		pub storage: Arc<MemoryStore>,
		/// Credential store shared by the client and coordinator.
		pub credentials: Arc<CredentialStore>,
		/// Coordinator shared by every client built from this harness.
		pub coordinator: Arc<RefreshCoordinator>,
		/// Navigation collaborator.
		pub navigator: Arc<CountingNavigator>,
	}

	/// Builds a reqwest HTTP client suitable for talking to `httpmock` servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::new().expect("Failed to build Reqwest client for tests.")
	}

	/// Constructs a client wired to an in-memory store, a counting navigator, and the reqwest
	/// transport, seeding the store with `seed` when provided.
	pub fn build_reqwest_test_client(
		config: ClientConfig,
		seed: Option<Credentials>,
	) -> TestHarness {
		let storage = Arc::new(MemoryStore::default());
		let backend: Arc<dyn KeyValueStore> = storage.clone();
		let credentials = Arc::new(CredentialStore::new(backend, config.credential_keys.clone()));

		if let Some(seed) = seed {
			credentials.store(&seed);
		}

		let navigator = Arc::new(CountingNavigator::default());
		let terminator = Arc::new(SessionTerminator::new(credentials.clone(), navigator.clone()));
		let http_client = Arc::new(test_reqwest_http_client());
		let renewer = Arc::new(HttpRenewer::new(http_client.clone(), config.renewal_url()));
		let coordinator =
			Arc::new(RefreshCoordinator::new(credentials.clone(), renewer, terminator));
		let client = ApiClient::new(config, http_client, coordinator.clone());

		TestHarness { client, storage, credentials, coordinator, navigator }
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::{
			Arc,
			atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
		},
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
