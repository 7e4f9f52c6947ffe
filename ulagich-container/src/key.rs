//! Component identification keys.
//!
//! [`TypeKey`] names a Rust type, [`Token`] is an explicit string binding,
//! and [`ComponentKey`] is the union the resolved registry is indexed by.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use ulagich_support::rendering::shorten_type_name;

/// Identifies a Rust type.
///
/// Equality and hashing use the [`TypeId`] only; the type name is carried
/// for diagnostics.
///
/// # Examples
/// ```
/// use ulagich_container::key::TypeKey;
///
/// let key = TypeKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.short_name(), "String");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Creates a key for type `T`. Trait objects are allowed.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Creates a key from a raw [`TypeId`] and type name.
    ///
    /// Prefer [`TypeKey::of`] when possible.
    #[inline]
    pub fn from_raw(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name with module paths stripped.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.type_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// An explicit string token standing in for a type.
///
/// ```
/// use ulagich_container::key::Token;
///
/// let token = Token::new("Logger");
/// assert_eq!(token.as_str(), "Logger");
/// assert_eq!(token, Token::from(String::from("Logger")));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Cow<'static, str>);

impl Token {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// Key of an entry in the resolved registry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ComponentKey {
    /// A nominal type.
    Type(TypeKey),
    /// An explicit token bound to some concrete type.
    Token(Token),
}

impl ComponentKey {
    /// Key for type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    pub fn token(name: impl Into<Token>) -> Self {
        Self::Token(name.into())
    }

    /// Name used in diagnostics and suggestions.
    pub fn display_name(&self) -> Cow<'static, str> {
        match self {
            Self::Type(ty) => Cow::Borrowed(ty.type_name()),
            Self::Token(token) => Cow::Owned(token.to_string()),
        }
    }
}

impl From<TypeKey> for ComponentKey {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl From<Token> for ComponentKey {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

impl From<&'static str> for ComponentKey {
    fn from(name: &'static str) -> Self {
        Self::Token(Token::new(name))
    }
}

impl From<String> for ComponentKey {
    fn from(name: String) -> Self {
        Self::Token(Token::from(name))
    }
}

impl From<&ComponentKey> for ComponentKey {
    fn from(key: &ComponentKey) -> Self {
        key.clone()
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "ComponentKey({})", ty.type_name()),
            Self::Token(token) => write!(f, "ComponentKey({token})"),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Token(token) => write!(f, "token {token}"),
        }
    }
}
