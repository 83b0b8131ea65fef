//! 记录存储
//!
//! 整个批次唯一的可变聚合。其他组件只读取快照或订阅事件。

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AppResult, StoreError};
use crate::models::{BatchSummary, CandidateFields, Record, RecordEvent, RecordId, RecordState};

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
}

/// 记录存储（可克隆的共享句柄）
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    inner: Arc<RwLock<Inner>>,
}

impl RecordStore {
    /// 由导入批次创建，全部记录为 `Pending`，id 为 `cv-{序号}`
    pub fn from_batch(batch: impl IntoIterator<Item = CandidateFields>) -> Self {
        let records = batch
            .into_iter()
            .enumerate()
            .map(|(i, fields)| Record::new(RecordId::from_index(i), fields))
            .collect();
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(Inner { records, index })),
        }
    }

    pub fn get(&self, id: &RecordId) -> Result<Record, StoreError> {
        let inner = self.read();
        inner
            .index
            .get(id)
            .map(|&i| inner.records[i].clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// 原子更新一条记录
    ///
    /// `mutator` 作用在副本上，成功后才整体写回；失败时记录保持原样。
    pub fn update<F>(&self, id: &RecordId, mutator: F) -> AppResult<Record>
    where
        F: FnOnce(&mut Record) -> AppResult<()>,
    {
        let mut inner = self.write();
        let position = *inner
            .index
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut working = inner.records[position].clone();
        mutator(&mut working)?;
        inner.records[position] = working.clone();

        Ok(working)
    }

    /// 按插入顺序返回全部记录
    pub fn all(&self) -> Vec<Record> {
        self.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids_in_state(&self, state: RecordState) -> Vec<RecordId> {
        self.read()
            .records
            .iter()
            .filter(|r| r.state == state)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn pending_ids(&self) -> Vec<RecordId> {
        self.ids_in_state(RecordState::Pending)
    }

    pub fn failed_ids(&self) -> Vec<RecordId> {
        self.ids_in_state(RecordState::Failed)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_states(self.read().records.iter().map(|r| r.state))
    }

    /// 显式重试单条记录：`Failed → Pending`，其他状态拒绝
    pub fn retry(&self, id: &RecordId) -> AppResult<Record> {
        self.update(id, |record| {
            record.apply(RecordEvent::Retry)?;
            Ok(())
        })
    }

    /// 重置当前所有 `Failed` 记录，返回它们的 id（按存储顺序）
    pub fn retry_failed(&self) -> AppResult<Vec<RecordId>> {
        let failed = self.failed_ids();
        for id in &failed {
            self.retry(id)?;
        }
        Ok(failed)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn store(n: usize) -> RecordStore {
        RecordStore::from_batch((0..n).map(|i| CandidateFields {
            full_name: format!("Candidate {}", i),
            email: format!("c{}@example.com", i),
            ..Default::default()
        }))
    }

    fn fail(store: &RecordStore, id: &RecordId) {
        store
            .update(id, |r| {
                r.apply(RecordEvent::Start)?;
                r.apply(RecordEvent::RegisterFailed {
                    error: "rejected".into(),
                })?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn assigns_ids_in_insertion_order() {
        let store = store(3);
        let ids: Vec<_> = store.all().into_iter().map(|r| r.id).collect();
        let expected: Vec<RecordId> = vec!["cv-0".into(), "cv-1".into(), "cv-2".into()];
        assert_eq!(ids, expected);
        assert_eq!(store.summary().pending, 3);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = store(1);
        assert_eq!(
            store.get(&"cv-9".into()),
            Err(StoreError::NotFound("cv-9".into()))
        );
    }

    #[test]
    fn failed_mutator_does_not_commit() {
        let store = store(1);
        let id = RecordId::from_index(0);

        let result = store.update(&id, |r| {
            r.apply(RecordEvent::Start)?;
            // 非法：Registering 不能直接开始上传
            r.apply(RecordEvent::BeginUpload)?;
            Ok(())
        });

        assert!(matches!(result, Err(AppError::Transition(_))));
        assert_eq!(store.get(&id).unwrap().state, RecordState::Pending);
    }

    #[test]
    fn retry_failed_touches_only_failed_records() {
        let store = store(3);
        let completed = RecordId::from_index(0);
        store
            .update(&completed, |r| {
                r.apply(RecordEvent::Start)?;
                r.apply(RecordEvent::RegisterSucceeded {
                    remote_user_id: "u0".into(),
                })?;
                r.apply(RecordEvent::BeginUpload)?;
                r.apply(RecordEvent::UploadSucceeded {
                    remote_document_id: "d0".into(),
                })?;
                Ok(())
            })
            .unwrap();
        fail(&store, &RecordId::from_index(1));
        let before = store.all();

        let retried = store.retry_failed().unwrap();

        assert_eq!(retried, vec![RecordId::from_index(1)]);
        let after = store.all();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].state, RecordState::Pending);
        assert!(after[1].error.is_none());
    }

    #[test]
    fn retry_rejects_pending_record() {
        let store = store(1);
        tokio_test::assert_err!(store.retry(&RecordId::from_index(0)));
    }
}
