//! Authentication Models
//! Principals, role markers, token claims and the auth request/response bodies.

use serde::{Deserialize, Serialize};

/// The three kinds of account that can log in. Each lives in its own table
/// and carries a different role marker, but authenticates the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Employee,
    Administrator,
}

impl PrincipalKind {
    pub fn table(&self) -> &'static str {
        match self {
            PrincipalKind::User => "usuarios",
            PrincipalKind::Employee => "funcionarios",
            PrincipalKind::Administrator => "administradores",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::User => "usuario",
            PrincipalKind::Employee => "funcionario",
            PrincipalKind::Administrator => "administrador",
        }
    }
}

/// Privilege marker stored with a principal and copied into its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleMarker {
    /// Employee job title, free text.
    Cargo(String),
    /// Administrator flag.
    Admin(bool),
}

/// JWT Claims payload
///
/// `cargo` and `is_admin` are omitted from the encoded token when absent;
/// a token with neither belongs to a plain user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    pub iat: i64,
    pub exp: i64,
}

/// Privilege level derived from which claims are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Employee(String),
    Administrator,
}

impl Claims {
    pub fn role(&self) -> Role {
        if self.is_admin == Some(true) {
            return Role::Administrator;
        }
        match self.cargo.as_deref() {
            Some(cargo) if !cargo.trim().is_empty() => Role::Employee(cargo.to_string()),
            _ => Role::User,
        }
    }

    /// True when the token carries no role marker at all.
    pub fn is_plain_user(&self) -> bool {
        self.cargo.is_none() && self.is_admin.is_none()
    }

    pub fn kind(&self) -> PrincipalKind {
        if self.is_admin.is_some() {
            PrincipalKind::Administrator
        } else if self.cargo.is_some() {
            PrincipalKind::Employee
        } else {
            PrincipalKind::User
        }
    }
}

/// Stored principal as read back from the credential store.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Option<RoleMarker>,
    pub phone: Option<String>,
    pub created_at: String,
}

/// Principal to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Option<RoleMarker>,
    pub phone: Option<String>,
}

/// Plaintext registration input, before hashing.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<RoleMarker>,
    pub phone: Option<String>,
}

/// POST /api/auth/registrar
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub nome: Option<String>,
    pub email: String,
    pub senha: String,
    #[serde(default)]
    pub telefone: Option<String>,
}

/// POST /api/auth/funcionarios/registrar
#[derive(Debug, Deserialize)]
pub struct RegisterEmployeeRequest {
    pub nome: String,
    pub cargo: String,
    pub email: String,
    pub senha: String,
}

/// POST /api/admin/administradores
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub nome: String,
    pub email: String,
    pub senha: String,
    #[serde(default = "default_true")]
    pub is_admin: bool,
}

fn default_true() -> bool {
    true
}

/// Login request body, shared by all principal kinds
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

/// Principal summary (sanitized, never carries the hash)
#[derive(Debug, Serialize, PartialEq)]
pub struct PrincipalResponse {
    pub id: i64,
    pub nome: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    pub criado_em: String,
}

impl PrincipalResponse {
    pub fn from_record(record: &CredentialRecord) -> Self {
        let (cargo, is_admin) = match &record.role {
            Some(RoleMarker::Cargo(c)) => (Some(c.clone()), None),
            Some(RoleMarker::Admin(flag)) => (None, Some(*flag)),
            None => (None, None),
        };
        Self {
            id: record.id,
            nome: record.name.clone(),
            email: record.email.clone(),
            telefone: record.phone.clone(),
            cargo,
            is_admin,
            criado_em: record.created_at.clone(),
        }
    }
}

/// Registration/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub principal: PrincipalResponse,
    pub token: String,
    pub expires_in: i64, // seconds until expiration
}

/// GET /api/perfil
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub tipo: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl ProfileResponse {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email.clone(),
            tipo: claims.kind().as_str(),
            cargo: claims.cargo.clone(),
            is_admin: claims.is_admin,
        }
    }
}

/// PUT /api/perfil/email
#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email_atual: String,
    pub novo_email: String,
    pub confirmar_email: String,
    pub senha: String,
}

/// PUT /api/perfil/telefone
#[derive(Debug, Deserialize)]
pub struct UpdatePhoneRequest {
    #[serde(default)]
    pub telefone_atual: Option<String>,
    pub novo_telefone: String,
    pub confirmar_telefone: String,
    pub senha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(cargo: Option<&str>, is_admin: Option<bool>) -> Claims {
        Claims {
            id: 7,
            email: "a@x.com".to_string(),
            cargo: cargo.map(str::to_string),
            is_admin,
            iat: 0,
            exp: 1,
        }
    }

    #[test]
    fn test_role_from_claim_presence() {
        assert_eq!(claims(None, None).role(), Role::User);
        assert_eq!(
            claims(Some("suporte"), None).role(),
            Role::Employee("suporte".to_string())
        );
        assert_eq!(claims(None, Some(true)).role(), Role::Administrator);
        assert_eq!(claims(None, Some(false)).role(), Role::User);
        assert_eq!(claims(Some("  "), None).role(), Role::User);
    }

    #[test]
    fn test_plain_user_claims_omit_role_fields() {
        let json = serde_json::to_value(claims(None, None)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("cargo"));
        assert!(!obj.contains_key("is_admin"));

        let json = serde_json::to_value(claims(None, Some(true))).unwrap();
        assert_eq!(json["is_admin"], true);
        assert!(!json.as_object().unwrap().contains_key("cargo"));
    }

    #[test]
    fn test_principal_response_never_has_hash() {
        let record = CredentialRecord {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            role: Some(RoleMarker::Cargo("vendas".to_string())),
            phone: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&PrincipalResponse::from_record(&record)).unwrap();
        assert!(!json.contains("$2b$"));
        assert!(json.contains("\"cargo\":\"vendas\""));
        assert!(!json.contains("telefone"));
    }

    #[test]
    fn test_profile_kind() {
        assert_eq!(ProfileResponse::from_claims(&claims(None, None)).tipo, "usuario");
        assert_eq!(
            ProfileResponse::from_claims(&claims(Some("ti"), None)).tipo,
            "funcionario"
        );
        assert_eq!(
            ProfileResponse::from_claims(&claims(None, Some(true))).tipo,
            "administrador"
        );
    }
}
