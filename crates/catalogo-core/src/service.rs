//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Project ordering service and re-sequencing rules."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use catalogo_store::{NewProject, ProjectPatch, ProjectRecord, SharedStore, StoreError, WriteBatch};
use serde::Deserialize;
use tracing::{debug, info};

use crate::metrics::OrderingMetrics;
use crate::ordering::{
    plan_compaction, plan_reorder, plan_resequence, plan_swap, sort_key, sort_projects, Direction,
    OrdenShift,
};
use crate::{Result, ServiceError};

/// Fields accepted when creating a project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProject {
    pub nombre: Option<String>,
    pub codigo: Option<String>,
    pub descripcion: Option<String>,
}

/// Fields accepted when updating a project. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub nombre: Option<String>,
    pub codigo: Option<String>,
    pub descripcion: Option<String>,
    pub orden: Option<i64>,
}

impl UpdateProject {
    /// Validated field patch, without the `orden` component.
    fn field_patch(&self) -> Result<ProjectPatch> {
        Ok(ProjectPatch {
            nombre: self
                .nombre
                .as_deref()
                .map(|value| required("nombre", Some(value)))
                .transpose()?,
            codigo: self
                .codigo
                .as_deref()
                .map(|value| required("codigo", Some(value)))
                .transpose()?,
            descripcion: self.descripcion.as_deref().map(|value| value.trim().to_string()),
            orden: None,
        })
    }
}

fn required(field: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ServiceError::validation(format!(
            "Faltan campos: {field} es obligatorio"
        ))),
    }
}

/// Listing, CRUD, and re-sequencing of projects on top of a document store.
///
/// Every order-affecting mutation re-reads the collection and commits its
/// writes through a single [`WriteBatch`].
#[derive(Clone)]
pub struct ProjectService {
    store: SharedStore,
    metrics: Option<OrderingMetrics>,
}

impl ProjectService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: OrderingMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Every project, sorted by `orden` with missing values last.
    pub async fn list(&self) -> Result<Vec<ProjectRecord>> {
        let mut records = self.store.list().await?;
        sort_projects(&mut records);
        Ok(records)
    }

    /// Append a project at `count + 1`.
    ///
    /// Counting and inserting are two separate store calls; concurrent creates
    /// can receive the same position.
    pub async fn create(&self, input: CreateProject) -> Result<ProjectRecord> {
        let nombre = required("nombre", input.nombre.as_deref())?;
        let codigo = required("codigo", input.codigo.as_deref())?;
        let descripcion = input
            .descripcion
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let count = self.store.count().await?;
        let record = self
            .store
            .insert(NewProject {
                nombre,
                codigo,
                descripcion,
                orden: count as i64 + 1,
            })
            .await?;
        self.observe("create", 1);
        info!(id = %record.id, orden = ?record.orden, "project created");
        Ok(record)
    }

    /// Overwrite supplied fields and, when `orden` changes, shift the records in
    /// between so the sequence stays dense.
    pub async fn update(&self, id: &str, input: UpdateProject) -> Result<()> {
        let mut patch = input.field_patch()?;
        if let Some(target) = input.orden {
            if target < 1 {
                return Err(ServiceError::validation("orden debe ser mayor o igual a 1"));
            }
        }

        let current = self.fetch(id).await?;
        let old = sort_key(&current);

        let mut batch = WriteBatch::new();
        let operation = match input.orden {
            Some(target) if current.orden != Some(target) => {
                let records = self.store.list().await?;
                let shifts = plan_reorder(&records, id, old, target);
                queue_shifts(&mut batch, &shifts);
                patch.orden = Some(target);
                "reorder"
            }
            _ => "update",
        };
        batch.update(id, patch);

        if batch.is_empty() {
            return Ok(());
        }
        self.commit(operation, id, batch).await
    }

    /// Remove a project and close the gap it leaves behind.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let current = self.fetch(id).await?;

        let mut batch = WriteBatch::new();
        batch.delete(id);
        if let Some(deleted) = current.orden {
            let records = self.store.list().await?;
            queue_shifts(&mut batch, &plan_compaction(&records, id, deleted));
        }
        self.commit("delete", id, batch).await
    }

    /// Swap a project with its neighbour in the sorted list.
    ///
    /// Returns `false` when the project already sits at that edge of the list.
    pub async fn swap_adjacent(&self, id: &str, direction: Direction) -> Result<bool> {
        let sorted = self.list().await?;
        let index = sorted
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        let Some(shifts) = plan_swap(&sorted, index, direction) else {
            debug!(id, ?direction, "swap at list edge ignored");
            return Ok(false);
        };
        let mut batch = WriteBatch::new();
        queue_shifts(&mut batch, &shifts);
        self.commit("swap", id, batch).await?;
        Ok(true)
    }

    /// Rewrite every position to `1..=n` in current list order.
    ///
    /// Returns the number of records whose position changed.
    pub async fn resequence(&self) -> Result<usize> {
        let sorted = self.list().await?;
        let shifts = plan_resequence(&sorted);
        if shifts.is_empty() {
            return Ok(0);
        }
        let mut batch = WriteBatch::new();
        queue_shifts(&mut batch, &shifts);
        let updated = batch.len();
        self.store.commit(batch).await?;
        self.observe("resequence", updated);
        info!(updated, "project sequence rewritten");
        Ok(updated)
    }

    async fn fetch(&self, id: &str) -> Result<ProjectRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    async fn commit(&self, operation: &'static str, id: &str, batch: WriteBatch) -> Result<()> {
        let writes = batch.len();
        match self.store.commit(batch).await {
            Ok(()) => {
                self.observe(operation, writes);
                debug!(operation, id, writes, "batch committed");
                Ok(())
            }
            // The record disappeared between the read and the commit.
            Err(StoreError::Missing(missing)) if missing == id => {
                Err(ServiceError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn observe(&self, operation: &str, writes: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.observe_commit(operation, writes);
        }
    }
}

fn queue_shifts(batch: &mut WriteBatch, shifts: &[OrdenShift]) {
    for shift in shifts {
        batch.set_orden(shift.id.clone(), shift.to);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use catalogo_store::{DocumentStore, MemoryStore};
    use prometheus::Registry;

    use super::*;

    fn record(id: &str, orden: Option<i64>) -> ProjectRecord {
        ProjectRecord {
            id: id.into(),
            nombre: format!("Project {id}"),
            codigo: id.to_uppercase(),
            descripcion: String::new(),
            orden,
        }
    }

    fn seeded(ordens: &[(&str, Option<i64>)]) -> (MemoryStore, ProjectService) {
        let store = MemoryStore::with_records(ordens.iter().map(|(id, orden)| record(id, *orden)));
        let service = ProjectService::new(Arc::new(store.clone()));
        (store, service)
    }

    fn ordens(store: &MemoryStore) -> BTreeMap<String, Option<i64>> {
        store
            .snapshot()
            .into_iter()
            .map(|(id, record)| (id, record.orden))
            .collect()
    }

    /// Deletes `vanishing` right before forwarding each commit, as a second
    /// admin would between this service's read and its write.
    struct RacingStore {
        inner: MemoryStore,
        vanishing: String,
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        fn backend(&self) -> &'static str {
            "racing"
        }

        async fn list(&self) -> catalogo_store::Result<Vec<ProjectRecord>> {
            self.inner.list().await
        }

        async fn get(&self, id: &str) -> catalogo_store::Result<Option<ProjectRecord>> {
            self.inner.get(id).await
        }

        async fn count(&self) -> catalogo_store::Result<usize> {
            self.inner.count().await
        }

        async fn insert(&self, project: NewProject) -> catalogo_store::Result<ProjectRecord> {
            self.inner.insert(project).await
        }

        async fn commit(&self, batch: WriteBatch) -> catalogo_store::Result<()> {
            let mut removal = WriteBatch::new();
            removal.delete(self.vanishing.clone());
            let _ = self.inner.commit(removal).await;
            self.inner.commit(batch).await
        }
    }

    fn racing(ordens: &[(&str, Option<i64>)], vanishing: &str) -> (MemoryStore, ProjectService) {
        let (store, _) = seeded(ordens);
        let racing = RacingStore {
            inner: store.clone(),
            vanishing: vanishing.into(),
        };
        (store, ProjectService::new(Arc::new(racing)))
    }

    fn draft(nombre: &str, codigo: &str) -> CreateProject {
        CreateProject {
            nombre: Some(nombre.into()),
            codigo: Some(codigo.into()),
            descripcion: None,
        }
    }

    fn move_to(orden: i64) -> UpdateProject {
        UpdateProject {
            orden: Some(orden),
            ..UpdateProject::default()
        }
    }

    #[tokio::test]
    async fn create_appends_after_current_count() {
        let (_, service) = seeded(&[("a", Some(1)), ("b", Some(2))]);
        let created = service.create(draft(" Gamma ", "G1")).await.unwrap();
        assert_eq!(created.orden, Some(3));
        assert_eq!(created.nombre, "Gamma");
        assert_eq!(created.descripcion, "");
    }

    #[tokio::test]
    async fn create_rejects_blank_fields_without_writing() {
        let (store, service) = seeded(&[]);
        let err = service.create(draft("   ", "X")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = service
            .create(CreateProject {
                nombre: Some("Solo".into()),
                ..CreateProject::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn list_sorts_missing_orden_last() {
        let (_, service) = seeded(&[("late", None), ("b", Some(2)), ("a", Some(1))]);
        let ids: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "late"]);
    }

    #[tokio::test]
    async fn reorder_up_shifts_only_the_range() {
        let (store, service) = seeded(&[
            ("a", Some(1)),
            ("b", Some(2)),
            ("c", Some(3)),
            ("d", Some(4)),
            ("e", Some(5)),
        ]);
        service.update("d", move_to(2)).await.unwrap();
        let after = ordens(&store);
        assert_eq!(after["a"], Some(1));
        assert_eq!(after["d"], Some(2));
        assert_eq!(after["b"], Some(3));
        assert_eq!(after["c"], Some(4));
        assert_eq!(after["e"], Some(5));
    }

    #[tokio::test]
    async fn reorder_down_folds_field_changes_into_batch() {
        let (store, service) = seeded(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3))]);
        service
            .update(
                "a",
                UpdateProject {
                    nombre: Some("Renamed".into()),
                    orden: Some(3),
                    ..UpdateProject::default()
                },
            )
            .await
            .unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot["a"].orden, Some(3));
        assert_eq!(snapshot["a"].nombre, "Renamed");
        assert_eq!(snapshot["b"].orden, Some(1));
        assert_eq!(snapshot["c"].orden, Some(2));
    }

    #[tokio::test]
    async fn same_orden_only_updates_fields() {
        let (store, service) = seeded(&[("a", Some(1)), ("b", Some(2))]);
        service
            .update(
                "b",
                UpdateProject {
                    codigo: Some("B-2".into()),
                    orden: Some(2),
                    ..UpdateProject::default()
                },
            )
            .await
            .unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot["b"].codigo, "B-2");
        assert_eq!(snapshot["a"].orden, Some(1));
        assert_eq!(snapshot["b"].orden, Some(2));
    }

    #[tokio::test]
    async fn update_rejects_blank_name_and_low_orden() {
        let (store, service) = seeded(&[("a", Some(1))]);
        let before = store.snapshot();
        let blank = UpdateProject {
            nombre: Some(" ".into()),
            ..UpdateProject::default()
        };
        assert!(matches!(
            service.update("a", blank).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.update("a", move_to(0)).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn update_unknown_project_is_not_found() {
        let (_, service) = seeded(&[("a", Some(1))]);
        let err = service.update("ghost", move_to(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn moving_record_without_orden_treats_it_as_last() {
        let (store, service) = seeded(&[("a", Some(1)), ("b", Some(2)), ("legacy", None)]);
        service.update("legacy", move_to(1)).await.unwrap();
        let after = ordens(&store);
        assert_eq!(after["legacy"], Some(1));
        assert_eq!(after["a"], Some(2));
        assert_eq!(after["b"], Some(3));
    }

    #[tokio::test]
    async fn delete_compacts_higher_positions() {
        let (store, service) = seeded(&[
            ("a", Some(1)),
            ("b", Some(2)),
            ("c", Some(3)),
            ("d", Some(4)),
        ]);
        service.delete("b").await.unwrap();
        let after = ordens(&store);
        assert!(!after.contains_key("b"));
        assert_eq!(after["a"], Some(1));
        assert_eq!(after["c"], Some(2));
        assert_eq!(after["d"], Some(3));
    }

    #[tokio::test]
    async fn delete_unknown_project_is_not_found() {
        let (store, service) = seeded(&[("a", Some(1))]);
        assert!(matches!(
            service.delete("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn swap_moves_one_step_and_ignores_edges() {
        let (store, service) = seeded(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3))]);
        assert!(service.swap_adjacent("b", Direction::Down).await.unwrap());
        let after = ordens(&store);
        assert_eq!(after["b"], Some(3));
        assert_eq!(after["c"], Some(2));

        let before = store.snapshot();
        assert!(!service.swap_adjacent("a", Direction::Up).await.unwrap());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn moving_up_a_trailing_record_without_orden_reorders_the_list() {
        let (_, service) = seeded(&[("a", Some(1)), ("b", Some(2)), ("legacy", None)]);
        assert!(service.swap_adjacent("legacy", Direction::Up).await.unwrap());
        let ids: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|record| (record.id, record.orden))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("a".to_string(), Some(1)),
                ("legacy".to_string(), Some(2)),
                ("b".to_string(), Some(3)),
            ]
        );
    }

    #[tokio::test]
    async fn resequence_densifies_the_list() {
        let (store, service) = seeded(&[
            ("a", Some(2)),
            ("b", Some(5)),
            ("c", Some(5)),
            ("d", None),
        ]);
        assert_eq!(service.resequence().await.unwrap(), 4);
        let after = ordens(&store);
        assert_eq!(after["a"], Some(1));
        assert_eq!(after["b"], Some(2));
        assert_eq!(after["c"], Some(3));
        assert_eq!(after["d"], Some(4));
        assert_eq!(service.resequence().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let (store, service) = seeded(&[("a", Some(1))]);
        store.set_unavailable(true);
        assert!(matches!(service.list().await, Err(ServiceError::Store(_))));
        assert!(matches!(
            service.create(draft("X", "Y")).await,
            Err(ServiceError::Store(_))
        ));
    }

    #[tokio::test]
    async fn commits_are_recorded_in_metrics() {
        let registry = Registry::new();
        let metrics = OrderingMetrics::new(&registry).unwrap();
        let (_, service) = seeded(&[("a", Some(1)), ("b", Some(2))]);
        let service = service.with_metrics(metrics);
        service.update("b", move_to(1)).await.unwrap();
        service.delete("a").await.unwrap();

        let families = registry.gather();
        let mutations = families
            .iter()
            .find(|family| family.get_name() == "catalogo_ordering_mutations_total")
            .unwrap();
        let total: f64 = mutations
            .get_metric()
            .iter()
            .map(|metric| metric.get_counter().get_value())
            .sum();
        assert_eq!(total, 2.0);
    }

    #[tokio::test]
    async fn target_vanishing_mid_reorder_is_not_found() {
        let (store, service) = racing(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3))], "a");
        let err = service.update("a", move_to(3)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref id) if id == "a"));
        assert_eq!(
            ordens(&store),
            BTreeMap::from([("b".into(), Some(2)), ("c".into(), Some(3))])
        );
    }

    #[tokio::test]
    async fn shifted_record_vanishing_mid_reorder_is_a_store_error() {
        let (store, service) = racing(&[("a", Some(1)), ("b", Some(2)), ("c", Some(3))], "c");
        let err = service.update("a", move_to(3)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::Missing(ref id)) if id == "c"
        ));
        // The batch was rejected as a whole; only the concurrent delete landed.
        assert_eq!(
            ordens(&store),
            BTreeMap::from([("a".into(), Some(1)), ("b".into(), Some(2))])
        );
    }
}
