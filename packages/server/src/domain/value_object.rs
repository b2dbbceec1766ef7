//! Value Objects
//!
//! 不変で、値そのものが同一性を表すドメインの型。生成時に検証を行い、
//! 不正な値を持つインスタンスは作れない。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

const CLIENT_ID_MAX_LEN: usize = 64;
const PLAYER_NAME_MAX_LEN: usize = 32;
const IDENTITY_MAX_LEN: usize = 64;

/// Connection identifier assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::ClientIdEmpty);
        }
        if value.len() > CLIENT_ID_MAX_LEN {
            return Err(ValueObjectError::ClientIdTooLong(value.len()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl TryFrom<String> for ClientId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates fresh `ClientId`s (`client-<uuid>`).
pub struct ClientIdFactory;

impl ClientIdFactory {
    pub fn generate() -> ClientId {
        ClientId(format!("client-{}", Uuid::new_v4().simple()))
    }
}

/// Display name chosen by the player.
///
/// Surrounding whitespace and control characters are stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(ValueObjectError::PlayerNameEmpty);
        }
        let len = cleaned.chars().count();
        if len > PLAYER_NAME_MAX_LEN {
            return Err(ValueObjectError::PlayerNameTooLong(len));
        }
        Ok(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Same name with a `.n` suffix, used to keep names unique on a server.
    ///
    /// The base is shortened so the result stays within the length limit.
    pub fn with_suffix(&self, suffix: u32) -> Self {
        let suffix = format!(".{}", suffix);
        let keep = PLAYER_NAME_MAX_LEN.saturating_sub(suffix.chars().count());
        let base: String = self.0.chars().take(keep).collect();
        Self(format!("{}{}", base, suffix))
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Platform identity token used as the ban-list key. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.len() > IDENTITY_MAX_LEN {
            return Err(ValueObjectError::IdentityTooLong(value.len()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_rejects_empty() {
        // テスト項目: 空文字列の ClientId は作成できない
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = ClientId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::ClientIdEmpty));
    }

    #[test]
    fn test_client_id_factory_generates_unique_ids() {
        // テスト項目: ClientIdFactory が毎回異なる ID を生成する
        // given (前提条件):

        // when (操作):
        let first = ClientIdFactory::generate();
        let second = ClientIdFactory::generate();

        // then (期待する結果):
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("client-"));
        assert!(ClientId::new(first.as_str().to_string()).is_ok());
    }

    #[test]
    fn test_player_name_is_trimmed() {
        // テスト項目: PlayerName は前後の空白と制御文字が取り除かれる
        // given (前提条件):
        let raw = "  Marble\u{7}Master \n".to_string();

        // when (操作):
        let name = PlayerName::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "MarbleMaster");
    }

    #[test]
    fn test_player_name_rejects_blank_and_long_names() {
        // テスト項目: 空白のみ、または長すぎる名前は拒否される
        // given (前提条件):
        let blank = "   ".to_string();
        let long = "x".repeat(PLAYER_NAME_MAX_LEN + 1);

        // when (操作):
        let blank_result = PlayerName::new(blank);
        let long_result = PlayerName::new(long);

        // then (期待する結果):
        assert_eq!(blank_result, Err(ValueObjectError::PlayerNameEmpty));
        assert_eq!(
            long_result,
            Err(ValueObjectError::PlayerNameTooLong(PLAYER_NAME_MAX_LEN + 1))
        );
    }

    #[test]
    fn test_player_name_with_suffix() {
        // テスト項目: with_suffix が ".n" を付けた名前を返す
        // given (前提条件):
        let name = PlayerName::new("Alice".to_string()).unwrap();

        // when (操作):
        let suffixed = name.with_suffix(2);

        // then (期待する結果):
        assert_eq!(suffixed.as_str(), "Alice.2");
    }

    #[test]
    fn test_player_name_with_suffix_stays_within_limit() {
        // テスト項目: 上限長の名前に接尾辞を付けても上限を超えない
        // given (前提条件):
        let name = PlayerName::new("y".repeat(PLAYER_NAME_MAX_LEN)).unwrap();

        // when (操作):
        let suffixed = name.with_suffix(12);

        // then (期待する結果):
        assert_eq!(suffixed.as_str().chars().count(), PLAYER_NAME_MAX_LEN);
        assert!(suffixed.as_str().ends_with(".12"));
        assert!(PlayerName::new(suffixed.as_str().to_string()).is_ok());
    }

    #[test]
    fn test_player_name_displays_as_plain_text() {
        // テスト項目: PlayerName を {} でフォーマットすると名前そのものになる
        // given (前提条件):
        let name = PlayerName::new("Marble King".to_string()).unwrap();

        // when (操作):
        let text = format!("'{}' joined", name);

        // then (期待する結果):
        assert_eq!(text, "'Marble King' joined");
    }
}
