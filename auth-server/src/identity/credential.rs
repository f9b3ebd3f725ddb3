//! Deterministic account credential
//!
//! Admin auth needs a password even though customers never type one. The
//! password is derived from data the gateway already has, so any instance can
//! recompute it without storing secrets.

use std::fmt;

/// Number of trailing CPF digits folded into the credential
const CPF_DIGITS: usize = 6;

/// Secret used for the provider's admin auth, never sent to customers
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Chooses between the derived credential and a configured override
#[derive(Debug, Clone, Default)]
pub struct CredentialPolicy {
    fixed: Option<Credential>,
}

impl CredentialPolicy {
    pub fn new(fixed: Option<String>) -> Self {
        Self {
            fixed: fixed.filter(|f| !f.is_empty()).map(Credential),
        }
    }

    /// Credential for the account of the customer with this CPF and email
    pub fn credential_for(&self, cpf: &str, email: &str) -> Credential {
        match &self.fixed {
            Some(fixed) => fixed.clone(),
            None => derive(cpf, email),
        }
    }
}

/// Builds a password that satisfies the default user pool policy: upper and
/// lower case letters, digits, a symbol and at least 8 characters.
fn derive(cpf: &str, email: &str) -> Credential {
    let digits: Vec<char> = cpf.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits[digits.len().saturating_sub(CPF_DIGITS)..]
        .iter()
        .collect();
    Credential(format!("Cpf#{:0>6}Em{:02}!", tail, email.chars().count()))
}
