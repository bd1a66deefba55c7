//! ---
//! cat_section: "02-storage"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Document store abstractions and backend bindings."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// A project document as stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Store-assigned opaque identifier.
    pub id: String,
    /// Display name.
    pub nombre: String,
    /// Human-facing code; not guaranteed unique.
    pub codigo: String,
    /// Free-form description, empty when not provided.
    #[serde(default)]
    pub descripcion: String,
    /// Display position; lower values render earlier. Legacy documents may lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orden: Option<i64>,
}

impl ProjectRecord {
    /// Overwrite the fields carried by `patch`.
    pub fn apply(&mut self, patch: &ProjectPatch) {
        if let Some(nombre) = &patch.nombre {
            self.nombre = nombre.clone();
        }
        if let Some(codigo) = &patch.codigo {
            self.codigo = codigo.clone();
        }
        if let Some(descripcion) = &patch.descripcion {
            self.descripcion = descripcion.clone();
        }
        if let Some(orden) = patch.orden {
            self.orden = Some(orden);
        }
    }
}

/// Fields of a record about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    /// Display name.
    pub nombre: String,
    /// Human-facing code.
    pub codigo: String,
    /// Free-form description.
    pub descripcion: String,
    /// Initial display position.
    pub orden: i64,
}

/// Partial update of a record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// Replacement name.
    pub nombre: Option<String>,
    /// Replacement code.
    pub codigo: Option<String>,
    /// Replacement description.
    pub descripcion: Option<String>,
    /// Replacement display position.
    pub orden: Option<i64>,
}

impl ProjectPatch {
    /// Patch that only moves a record.
    pub fn orden(orden: i64) -> Self {
        Self {
            orden: Some(orden),
            ..Self::default()
        }
    }

    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.codigo.is_none()
            && self.descripcion.is_none()
            && self.orden.is_none()
    }

    /// Names of the fields carried by the patch, in a stable order.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::with_capacity(4);
        if self.nombre.is_some() {
            paths.push("nombre");
        }
        if self.codigo.is_some() {
            paths.push("codigo");
        }
        if self.descripcion.is_some() {
            paths.push("descripcion");
        }
        if self.orden.is_some() {
            paths.push("orden");
        }
        paths
    }
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Overwrite the patched fields of an existing document.
    Update {
        /// Target document.
        id: String,
        /// Fields to overwrite.
        patch: ProjectPatch,
    },
    /// Remove an existing document.
    Delete {
        /// Target document.
        id: String,
    },
}

impl WriteOp {
    /// Identifier of the targeted document.
    pub fn id(&self) -> &str {
        match self {
            WriteOp::Update { id, .. } | WriteOp::Delete { id } => id,
        }
    }
}

/// Ordered list of writes committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a partial update. Empty patches are ignored.
    pub fn update(&mut self, id: impl Into<String>, patch: ProjectPatch) -> &mut Self {
        if !patch.is_empty() {
            self.writes.push(WriteOp::Update {
                id: id.into(),
                patch,
            });
        }
        self
    }

    /// Queue a position change.
    pub fn set_orden(&mut self, id: impl Into<String>, orden: i64) -> &mut Self {
        self.update(id, ProjectPatch::orden(orden))
    }

    /// Queue a delete.
    pub fn delete(&mut self, id: impl Into<String>) -> &mut Self {
        self.writes.push(WriteOp::Delete { id: id.into() });
        self
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True when nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Borrow the queued writes in commit order.
    pub fn writes(&self) -> &[WriteOp] {
        &self.writes
    }

    /// Consume the batch, yielding its writes in commit order.
    pub fn into_writes(self) -> Vec<WriteOp> {
        self.writes
    }
}
