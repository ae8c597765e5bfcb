use std::sync::Arc;
use tokio::sync::watch;

use crate::components::shell::{Shell, ShellCommand, ShellMsg, ShellView};
use crate::gateway::{EntryStore, MutationGateway, MutationOutcome};
use crate::idprovider::interface::{AuthState, IdentityProvider, SignInRequest};
use crate::session::{SignInDecision, SignInHandlers};

/// Drives the shell against an identity provider and a store.
///
/// The shell only ever learns about the session through [`App::sync_session`],
/// which reads the latest observed auth state. Sign in runs the result
/// handlers to completion before syncing, so a session the guard signs out
/// again is never shown as signed in.
pub struct App<I: ?Sized, S> {
    idp: Arc<I>,
    gateway: MutationGateway<S>,
    shell: Shell,
    auth: watch::Receiver<AuthState>,
}

impl<I, S> App<I, S>
where
    I: IdentityProvider + ?Sized,
    S: EntryStore,
{
    pub fn new(idp: Arc<I>, store: S) -> Self {
        let auth = idp.observe();
        let mut shell = Shell::new();
        shell.begin_observing();
        App {
            idp,
            gateway: MutationGateway::new(store),
            shell,
            auth,
        }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn gateway(&self) -> &MutationGateway<S> {
        &self.gateway
    }

    pub fn view(&self) -> ShellView {
        self.shell.view()
    }

    /// Wait for the provider to publish a new auth state. Returns false once
    /// the provider has gone away.
    pub async fn changed(&mut self) -> bool {
        self.auth.changed().await.is_ok()
    }

    /// Apply the latest observed auth state. Entering a session loads the
    /// table.
    pub async fn sync_session(&mut self) -> bool {
        let observed = self.auth.borrow_and_update().clone();
        let was_signed_in = self.shell.session().is_signed_in();
        if !self.shell.apply_session(&observed) {
            return false;
        }
        if !was_signed_in && self.shell.session().is_signed_in() {
            self.refresh().await;
        }
        true
    }

    pub async fn sign_in(&mut self, request: SignInRequest) -> SignInDecision {
        let outcome = self.idp.sign_in(request).await;
        let decision = SignInHandlers::new(&*self.idp).handle(outcome).await;
        if let Some(alert) = decision.alert() {
            self.shell.set_alert(Some(alert.to_string()));
        }
        self.sync_session().await;
        decision
    }

    pub async fn sign_out(&mut self) {
        if let Err(err) = self.idp.sign_out().await {
            error!(?err, "sign out failed");
        }
        self.sync_session().await;
    }

    /// Feed a message to the shell and carry out what it asks for. A
    /// mutation is always followed by a refresh, whether it succeeded or
    /// not.
    pub async fn send(&mut self, msg: ShellMsg) -> Option<MutationOutcome> {
        match self.shell.update(msg) {
            ShellCommand::None => None,
            ShellCommand::SignOut => {
                self.sign_out().await;
                None
            }
            ShellCommand::Mutate(mutation) => {
                let outcome = self.gateway.dispatch(mutation).await;
                self.refresh().await;
                Some(outcome)
            }
        }
    }

    /// Reload the table from the store. A failed load keeps the rows already
    /// shown.
    pub async fn refresh(&mut self) -> bool {
        if !self.shell.session().is_signed_in() {
            return false;
        }
        match self.gateway.list().await {
            Ok(entries) => self.shell.set_entries(Arc::new(entries)),
            Err(err) => {
                error!(?err, "unable to load entries");
                false
            }
        }
    }
}
