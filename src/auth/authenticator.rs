use anyhow::Result;
use std::{fmt, sync::Arc};
use tracing::{debug, info, instrument};

use super::{
    credential::Credential,
    digest::PasswordDigest,
    directory::{UserDirectory, UserRecord},
    notice::{Flash, Severity},
    store::{SessionStore, SessionToken},
};

pub const INVALID_CREDENTIAL_MESSAGE: &str = "Invalid email/password combination";

/// Why a login attempt was rejected. Unknown emails and wrong passwords are
/// deliberately indistinguishable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthFailure {
    InvalidCredential,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential => f.write_str(INVALID_CREDENTIAL_MESSAGE),
        }
    }
}

#[derive(Debug)]
pub enum AuthOutcome {
    Success {
        user: UserRecord,
        session: SessionToken,
        redirect_to: String,
    },
    Failure(AuthFailure),
}

impl AuthOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug)]
pub enum SessionState {
    Anonymous,
    Authenticated(UserRecord),
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// What the view layer needs to render a blank login form.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct LoginForm {
    pub email: String,
}

pub struct SessionAuthenticator {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn SessionStore>,
    placeholder: PasswordDigest,
}

impl SessionAuthenticator {
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            directory,
            store,
            placeholder: PasswordDigest::placeholder(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    #[must_use]
    pub fn present_new_form(&self) -> LoginForm {
        LoginForm::default()
    }

    /// Check a credential and, on success, bind a new session to the user.
    ///
    /// `previous` is the session the client presented with the login, if any.
    /// It is ended before the new session is bound.
    ///
    /// A rejected credential is not an error: it yields
    /// [`AuthOutcome::Failure`] and pushes a danger notice onto `flash`.
    ///
    /// # Errors
    /// Returns an error only when the directory or the session store fails.
    #[instrument(skip_all, fields(email = %credential.email()))]
    pub async fn authenticate(
        &self,
        credential: &Credential,
        flash: &mut Flash,
        previous: Option<&SessionToken>,
    ) -> Result<AuthOutcome> {
        let email = credential.normalized_email();
        let user = self.directory.find_by_email(&email).await?;

        // Unknown users still cost one verification.
        let verified = match &user {
            Some(user) => user.password_digest.verify(credential.password()),
            None => {
                let _ = self.placeholder.verify(credential.password());
                false
            }
        };

        match user {
            Some(user) if verified => {
                self.end_session(previous).await?;
                let session = self.store.bind(user.id).await?;
                let redirect_to = user.profile_path();

                info!(user_id = %user.id, "session established");

                Ok(AuthOutcome::Success {
                    user,
                    session,
                    redirect_to,
                })
            }
            _ => {
                debug!("rejected credential");

                flash.now(Severity::Danger, INVALID_CREDENTIAL_MESSAGE);

                Ok(AuthOutcome::Failure(AuthFailure::InvalidCredential))
            }
        }
    }

    /// Destroy the binding for `token`, if any. Missing or unknown tokens are a no-op.
    ///
    /// # Errors
    /// Returns an error when the session store fails.
    #[instrument(skip_all)]
    pub async fn end_session(&self, token: Option<&SessionToken>) -> Result<()> {
        let Some(token) = token else {
            return Ok(());
        };

        if self.store.clear(token).await? {
            info!("session ended");
        } else {
            debug!("no session bound to token");
        }

        Ok(())
    }

    /// Resolve the presented token into the current session state.
    ///
    /// # Errors
    /// Returns an error when the store or the directory fails.
    #[instrument(skip_all)]
    pub async fn current_session(&self, token: Option<&SessionToken>) -> Result<SessionState> {
        let Some(token) = token else {
            return Ok(SessionState::Anonymous);
        };

        let Some(user_id) = self.store.resolve(token).await? else {
            return Ok(SessionState::Anonymous);
        };

        Ok(self
            .directory
            .find_by_id(user_id)
            .await?
            .map_or(SessionState::Anonymous, SessionState::Authenticated))
    }
}
