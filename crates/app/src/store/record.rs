//! Record mapping between typed models and stored documents.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::store::{Collection, Document, Fields, StoreError};

const ID_FIELD: &str = "id";

/// A typed model persisted as a document in [`Record::COLLECTION`].
///
/// The model's `id` field is carried by the document id, never stored among
/// the fields. Decoding validates the model, so every record handed out by a
/// repository satisfies its invariants.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    /// Check model invariants, returning every violation found.
    fn validate(&self) -> Result<(), Vec<String>> {
        Ok(())
    }

    /// Encode into document fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] when the model does not encode
    /// into a JSON object.
    fn to_store(&self) -> Result<Fields, StoreError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => {
                fields.remove(ID_FIELD);
                Ok(fields)
            }
            Ok(other) => Err(StoreError::InvalidArgument(format!(
                "{} record encoded as {other}",
                Self::COLLECTION
            ))),
            Err(source) => Err(StoreError::InvalidArgument(source.to_string())),
        }
    }

    /// Decode and validate a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] when the fields do not describe a
    /// valid model.
    fn from_store(document: Document) -> Result<Self, StoreError> {
        let Document { id, mut fields } = document;

        fields.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let record: Self =
            serde_json::from_value(Value::Object(fields)).map_err(|source| {
                StoreError::Malformed {
                    collection: Self::COLLECTION,
                    id: id.clone(),
                    reason: source.to_string(),
                }
            })?;

        record
            .validate()
            .map_err(|violations| StoreError::Malformed {
                collection: Self::COLLECTION,
                id,
                reason: violations.join(", "),
            })?;

        Ok(record)
    }
}

/// Decode every document, skipping (and logging) ones that fail validation.
pub(crate) fn decode_valid<R: Record>(documents: Vec<Document>) -> Vec<R> {
    documents
        .into_iter()
        .filter_map(|document| match R::from_store(document) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!("skipping invalid {} document: {error}", R::COLLECTION);
                None
            }
        })
        .collect()
}
