use crate::store::PreferencesStore;

#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    nickname: Option<String>,
}

#[async_trait::async_trait]
impl PreferencesStore for InMemoryPreferences {
    async fn nickname(&self) -> Option<String> {
        self.nickname.clone()
    }

    async fn set_nickname(&mut self, nickname: &str) {
        self.nickname = Some(nickname.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nickname_round_trip() {
        let mut store = InMemoryPreferences::default();
        assert_eq!(store.nickname().await, None);

        store.set_nickname("Ada").await;
        assert_eq!(store.nickname().await, Some("Ada".to_string()));
    }
}
