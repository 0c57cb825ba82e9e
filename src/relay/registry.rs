//! リレーが接続済みのページコンテキストを管理する

use std::collections::HashMap;
use std::fmt;
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

use super::runtime::RelayHandle;
use super::RelayError;

/// ページコンテキストの識別子（タブ 1 つ、ページ読み込み 1 回分）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(String);

impl ContextId {
    /// 新しい識別子を作成
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 文字列表現を取得
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 接続済みコンテキスト → リレー端点 のプロセス全体のマップ
///
/// クローンは同じマップを共有する。
#[derive(Debug, Clone, Default)]
pub struct RelayRegistry {
    /// 起動中の各リレーの端点
    relays: Arc<Mutex<HashMap<ContextId, RelayHandle>>>,
}

impl RelayRegistry {
    /// 空の登録簿を作成
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `context` に接続済みのリレーを返す。未接続なら `attach` で作成する。
    ///
    /// `attach` を実行した場合はフラグが `true` になる。`attach` の実行中は
    /// ロックを保持するため、同時に 2 回接続されることはない。
    pub(crate) fn get_or_attach(
        &self,
        context: &ContextId,
        attach: impl FnOnce() -> Result<RelayHandle, RelayError>,
    ) -> Result<(RelayHandle, bool), RelayError> {
        let mut relays = self.relays.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = relays.get(context) {
            return Ok((handle.clone(), false));
        }
        let handle = attach()?;
        relays.insert(context.clone(), handle.clone());
        Ok((handle, true))
    }

    /// `context` にリレーが接続済みか
    #[must_use]
    pub fn is_attached(&self, context: &ContextId) -> bool {
        self.relays.lock().unwrap_or_else(PoisonError::into_inner).contains_key(context)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    /// get_or_attach: 2 回目は既存の端点を返す
    #[rstest]
    #[googletest::test]
    fn second_attach_reuses_handle() {
        let registry = RelayRegistry::new();
        let context = ContextId::new("tab-1");
        let mut attached = 0;

        let (_, first) = registry
            .get_or_attach(&context, || {
                attached += 1;
                Ok(RelayHandle::disconnected(context.clone()))
            })
            .unwrap();
        let (_, second) = registry
            .get_or_attach(&context, || {
                attached += 1;
                Ok(RelayHandle::disconnected(context.clone()))
            })
            .unwrap();

        expect_that!(first, eq(true));
        expect_that!(second, eq(false));
        expect_that!(attached, eq(1));
    }

    /// get_or_attach: 失敗した場合は未接続のまま
    #[rstest]
    #[googletest::test]
    fn failed_attach_leaves_context_detached() {
        let registry = RelayRegistry::new();
        let context = ContextId::new("tab-1");

        let result = registry.get_or_attach(&context, || {
            Err(RelayError::Injection { path: "x.js".to_string(), reason: "no body".to_string() })
        });

        expect_that!(result, err(anything()));
        expect_that!(registry.is_attached(&context), eq(false));
    }

    /// クローンは状態を共有する
    #[rstest]
    #[googletest::test]
    fn clones_share_state() {
        let registry = RelayRegistry::new();
        let shared = registry.clone();
        let context = ContextId::new("tab-1");

        registry.get_or_attach(&context, || Ok(RelayHandle::disconnected(context.clone()))).unwrap();

        expect_that!(shared.is_attached(&context), eq(true));
        expect_that!(shared.is_attached(&ContextId::new("tab-2")), eq(false));
    }
}
