//! In memory stand ins for the document store and the identity provider,
//! used to drive the interaction core without a network.

use async_trait::async_trait;
use outreach_proto::{AuthErrorCode, Entry, EntryDraft, EntryId, EntryPatch, SessionUser, SignInMethod};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::gateway::{EntryStore, GatewayError};
use crate::idprovider::interface::{
    AuthState, IdentityProvider, IdpError, SignInFailure, SignInOutcome, SignInRequest,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // a test that panicked while holding the lock has already failed
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A call the store received, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create(EntryDraft),
    Update(EntryId, EntryPatch),
    Delete(EntryId),
    List,
}

#[derive(Default)]
struct MemoryStoreInner {
    entries: BTreeMap<EntryId, Entry>,
    calls: Vec<StoreCall>,
    failing: bool,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Make every following create, update and delete fail. Listing keeps
    /// working.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.inner).failing = failing;
    }

    pub fn insert(&self, entry: Entry) {
        lock(&self.inner).entries.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, id: &EntryId) -> Option<Entry> {
        lock(&self.inner).entries.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.inner).calls.clone()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn create(&self, draft: &EntryDraft, date_created: &str) -> Result<EntryId, GatewayError> {
        let mut inner = lock(&self.inner);
        inner.calls.push(StoreCall::Create(draft.clone()));
        if inner.failing {
            return Err(GatewayError::Store("create rejected".to_string()));
        }
        inner.next_id += 1;
        let id = EntryId::new(format!("entry-{:04}", inner.next_id));
        let entry = draft
            .clone()
            .into_entry(id.clone(), Some(date_created.to_string()));
        inner.entries.insert(id.clone(), entry);
        Ok(id)
    }

    async fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<(), GatewayError> {
        let mut inner = lock(&self.inner);
        inner.calls.push(StoreCall::Update(id.clone(), patch.clone()));
        if inner.failing {
            return Err(GatewayError::Store("update rejected".to_string()));
        }
        let current = inner
            .entries
            .get(id)
            .ok_or_else(|| GatewayError::NotFound(id.clone()))?;
        let next = patch.apply(current);
        inner.entries.insert(id.clone(), next);
        Ok(())
    }

    async fn delete(&self, id: &EntryId) -> Result<(), GatewayError> {
        let mut inner = lock(&self.inner);
        inner.calls.push(StoreCall::Delete(id.clone()));
        if inner.failing {
            return Err(GatewayError::Store("delete rejected".to_string()));
        }
        inner
            .entries
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound(id.clone()))
    }

    async fn list(&self) -> Result<Vec<Entry>, GatewayError> {
        let mut inner = lock(&self.inner);
        inner.calls.push(StoreCall::List);
        Ok(inner.entries.values().cloned().collect())
    }
}

struct MockAccount {
    uid: String,
    password: String,
    display_name: Option<String>,
    methods: Vec<SignInMethod>,
}

#[derive(Default)]
struct MockIdentityInner {
    accounts: BTreeMap<String, MockAccount>,
    allow_shadow_accounts: bool,
    lookup_failing: bool,
    sign_outs: usize,
    next_uid: u64,
}

/// An identity provider keyed by email. Federated sign ins use the id
/// token as the email address.
pub struct MockIdentity {
    state: watch::Sender<AuthState>,
    inner: Mutex<MockIdentityInner>,
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentity {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        MockIdentity {
            state,
            inner: Mutex::new(MockIdentityInner::default()),
        }
    }

    pub fn register(&self, email: &str, password: &str, methods: Vec<SignInMethod>) {
        let mut inner = lock(&self.inner);
        inner.next_uid += 1;
        let uid = format!("uid-{}", inner.next_uid);
        inner.accounts.insert(
            email.to_string(),
            MockAccount {
                uid,
                password: password.to_string(),
                display_name: None,
                methods,
            },
        );
    }

    /// Let a password sign up succeed for an email that already has an
    /// account, without the provider recording the new method. This is the
    /// situation the sign in guard exists for.
    pub fn set_allow_shadow_accounts(&self, allow: bool) {
        lock(&self.inner).allow_shadow_accounts = allow;
    }

    pub fn set_lookup_failing(&self, failing: bool) {
        lock(&self.inner).lookup_failing = failing;
    }

    pub fn sign_out_count(&self) -> usize {
        lock(&self.inner).sign_outs
    }

    /// Resolve the initial state as the provider would after checking for a
    /// persisted session.
    pub fn resolve(&self, state: AuthState) {
        self.publish(state);
    }

    fn publish(&self, next: AuthState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn attempt(&self, request: &SignInRequest) -> Result<SessionUser, AuthErrorCode> {
        let mut inner = lock(&self.inner);
        let allow_shadow = inner.allow_shadow_accounts;
        inner.next_uid += 1;
        let fresh_uid = format!("uid-{}", inner.next_uid);

        let (email, account) = match request {
            SignInRequest::Password { email, password } => {
                let account = inner
                    .accounts
                    .get(email)
                    .ok_or(AuthErrorCode::UserNotFound)?;
                if !account.methods.contains(&SignInMethod::Password)
                    || account.password != *password
                {
                    return Err(AuthErrorCode::InvalidCredentials);
                }
                (email, account)
            }
            SignInRequest::SignUp {
                email,
                password,
                display_name,
            } => {
                if inner.accounts.contains_key(email) {
                    if !allow_shadow {
                        return Err(AuthErrorCode::EmailAlreadyInUse);
                    }
                } else {
                    inner.accounts.insert(
                        email.clone(),
                        MockAccount {
                            uid: fresh_uid,
                            password: password.clone(),
                            display_name: display_name.clone(),
                            methods: vec![SignInMethod::Password],
                        },
                    );
                }
                (email, &inner.accounts[email])
            }
            SignInRequest::Federated {
                provider_id,
                id_token,
            } => {
                let method = SignInMethod::Federated(provider_id.clone());
                let account = inner
                    .accounts
                    .entry(id_token.clone())
                    .or_insert_with(|| MockAccount {
                        uid: fresh_uid,
                        password: String::new(),
                        display_name: None,
                        methods: Vec::new(),
                    });
                if !account.methods.contains(&method) {
                    account.methods.push(method);
                }
                (id_token, &*account)
            }
        };

        Ok(SessionUser {
            uid: account.uid.clone(),
            display_name: account.display_name.clone(),
            email: Some(email.clone()),
        })
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    fn observe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    async fn sign_in(&self, request: SignInRequest) -> SignInOutcome {
        match self.attempt(&request) {
            Ok(user) => {
                self.publish(AuthState::SignedIn(user.clone()));
                SignInOutcome::Success {
                    user,
                    method: request.method(),
                }
            }
            Err(code) => SignInOutcome::Failure(SignInFailure {
                message: code.to_string(),
                code,
            }),
        }
    }

    async fn fetch_sign_in_methods(&self, email: &str) -> Result<Vec<SignInMethod>, IdpError> {
        let inner = lock(&self.inner);
        if inner.lookup_failing {
            return Err(IdpError::Transport);
        }
        Ok(inner
            .accounts
            .get(email)
            .map(|a| a.methods.clone())
            .unwrap_or_default())
    }

    async fn sign_out(&self) -> Result<(), IdpError> {
        lock(&self.inner).sign_outs += 1;
        self.publish(AuthState::SignedOut);
        Ok(())
    }
}
