//! MongoDB engine adapter.
//!
//! Commands are parsed by [`parse_command`] and dispatched by function name.
//! Every operation, including connecting, is bounded by the document
//! timeout; running out of time is an ordinary failure.

use super::command::shell_to_json;
use super::{
    parse_command, with_timeout, Call, ConnectionDescriptor, EngineAdapter, EngineSettings,
    Outcome, ParsedCommand, Value,
};
use crate::error::{Result, TabulaError};
use crate::render::{ArtifactKind, Table};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection, Database};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Headers of a describe table.
const DESCRIBE_HEADERS: [&str; 2] = ["key", "data_type"];

/// MongoDB connection bound to one database.
#[derive(Debug)]
pub struct DocumentAdapter {
    client: Option<Client>,
    database: Option<Database>,
    timeout: Duration,
}

impl DocumentAdapter {
    fn database(&self) -> Result<&Database> {
        self.database
            .as_ref()
            .ok_or_else(|| TabulaError::internal("MongoDB connection already closed"))
    }

    fn collection(&self, name: &str) -> Result<Collection<Document>> {
        Ok(self.database()?.collection::<Document>(name))
    }

    async fn run(&self, command: &ParsedCommand) -> Result<Outcome> {
        let collection = self.collection(&command.collection)?;
        let name = command.collection.as_str();

        if command.function != "find" && !command.modifiers.is_empty() {
            return Err(TabulaError::query(format!(
                "{} does not accept modifiers",
                command.function
            )));
        }

        match command.function.as_str() {
            "find" => {
                let mut find = collection.find(document_argument(command.argument(0))?);
                for modifier in &command.modifiers {
                    find = match modifier.name.as_str() {
                        "sort" => find.sort(document_argument(modifier_argument(modifier))?),
                        "skip" => find.skip(number_argument(modifier)?),
                        "limit" => find.limit(i64::try_from(number_argument(modifier)?).map_err(
                            |_| TabulaError::query("limit is too large"),
                        )?),
                        other => {
                            return Err(TabulaError::query(format!(
                                "{other} is not an available modifier"
                            )))
                        }
                    };
                }

                let documents: Vec<Document> = find
                    .await
                    .map_err(query_error)?
                    .try_collect()
                    .await
                    .map_err(query_error)?;
                debug!("find returned {} documents", documents.len());
                Ok(Outcome::from_table(
                    documents_table(&documents),
                    ArtifactKind::Document,
                ))
            }
            "findOne" => {
                let document = collection
                    .find_one(document_argument(command.argument(0))?)
                    .await
                    .map_err(query_error)?;
                let documents: Vec<Document> = document.into_iter().collect();
                Ok(Outcome::from_table(
                    documents_table(&documents),
                    ArtifactKind::Document,
                ))
            }
            "countDocuments" => {
                let total = collection
                    .count_documents(document_argument(command.argument(0))?)
                    .await
                    .map_err(query_error)?;
                Ok(Outcome::Message(format!(
                    "Collection {name} count: {total} results."
                )))
            }
            "insertOne" => {
                let document = required(command, 0, "a document")
                    .and_then(|arg| document_argument(Some(arg)))?;
                let inserted = collection.insert_one(document).await.map_err(query_error)?;
                Ok(Outcome::Message(format!(
                    "Collection {name}, document inserted with ID: {}",
                    id_text(&inserted.inserted_id)
                )))
            }
            "insertMany" => {
                let documents = required(command, 0, "an array of documents")
                    .and_then(documents_argument)?;
                let inserted = collection
                    .insert_many(documents)
                    .await
                    .map_err(query_error)?;

                let mut ids: Vec<(usize, Bson)> = inserted.inserted_ids.into_iter().collect();
                ids.sort_by_key(|(index, _)| *index);
                let ids: Vec<String> = ids.iter().map(|(_, id)| id_text(id)).collect();
                Ok(Outcome::Message(format!(
                    "Collection {name}, documents inserted with ID(s): {}",
                    ids.join(", ")
                )))
            }
            "deleteOne" | "deleteMany" => {
                let filter = required(command, 0, "a filter document")
                    .and_then(|arg| document_argument(Some(arg)))?;
                let deleted = if command.function == "deleteOne" {
                    collection.delete_one(filter).await
                } else {
                    collection.delete_many(filter).await
                }
                .map_err(query_error)?
                .deleted_count;
                Ok(Outcome::Message(format!(
                    "Collection {name}, deleted {deleted} document(s)"
                )))
            }
            "updateOne" | "updateMany" => {
                let filter = required(command, 0, "a filter and an update document")
                    .and_then(|arg| document_argument(Some(arg)))?;
                let update = required(command, 1, "a filter and an update document")
                    .and_then(|arg| document_argument(Some(arg)))?;
                let modified = if command.function == "updateOne" {
                    collection.update_one(filter, update).await
                } else {
                    collection.update_many(filter, update).await
                }
                .map_err(query_error)?
                .modified_count;
                Ok(Outcome::Message(format!(
                    "Collection {name}, updated {modified} document(s)"
                )))
            }
            "drop" => {
                collection.drop().await.map_err(query_error)?;
                Ok(Outcome::Message(format!(
                    "Collection {name} dropped successfully."
                )))
            }
            other => Err(TabulaError::query(format!(
                "{other} is not an available function"
            ))),
        }
    }

    async fn sample(&self, name: &str) -> Result<Option<Document>> {
        let mut cursor = self
            .collection(name)?
            .find(doc! {})
            .await
            .map_err(query_error)?;

        let mut best = None;
        while let Some(document) = cursor.try_next().await.map_err(query_error)? {
            best = keep_widest(best, document);
        }
        Ok(best)
    }
}

#[async_trait]
impl EngineAdapter for DocumentAdapter {
    async fn open(descriptor: &ConnectionDescriptor, settings: &EngineSettings) -> Result<Self>
    where
        Self: Sized,
    {
        let timeout = settings.document_timeout;
        info!("Opening MongoDB connection");

        let client = with_timeout(timeout, async {
            Client::with_uri_str(descriptor.conn_str.trim())
                .await
                .map_err(|e| TabulaError::connection(e.to_string()))
        })
        .await
        .map_err(TabulaError::into_connection)?;

        let database = match descriptor.db_name.trim() {
            "" => client.default_database().ok_or_else(|| {
                TabulaError::config("MongoDB needs a database name in --dbname or the URI")
            })?,
            name => client.database(name),
        };

        let mut adapter = Self {
            client: Some(client),
            database: Some(database),
            timeout,
        };
        if let Err(e) = adapter.ping().await {
            adapter.close().await?;
            return Err(e);
        }
        Ok(adapter)
    }

    async fn list_entities(&mut self) -> Result<Vec<String>> {
        let database = self.database()?;
        let mut names = with_timeout(self.timeout, async {
            database.list_collection_names().await.map_err(query_error)
        })
        .await?;
        names.sort();
        Ok(names)
    }

    async fn describe_entity(&mut self, name: &str) -> Result<Outcome> {
        let representative = with_timeout(self.timeout, self.sample(name.trim())).await?;
        let Some(document) = representative else {
            return Ok(Outcome::Empty);
        };

        debug!(
            "Representative document for {} has {} fields",
            name,
            document.len()
        );
        Ok(Outcome::from_table(
            describe_table(&document),
            ArtifactKind::Document,
        ))
    }

    async fn execute(&mut self, input: &str) -> Result<Outcome> {
        let command = parse_command(input)?;
        debug!(
            "Running {} on collection {}",
            command.function, command.collection
        );
        with_timeout(self.timeout, self.run(&command)).await
    }

    async fn ping(&mut self) -> Result<()> {
        let database = self.database()?;
        with_timeout(self.timeout, async {
            database
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(|e| TabulaError::connection(e.to_string()))
        })
        .await
        .map(|_| ())
        .map_err(TabulaError::into_connection)
    }

    async fn close(&mut self) -> Result<()> {
        self.database = None;
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            debug!("MongoDB connection closed");
        }
        Ok(())
    }
}

/// Keeps the document with strictly more fields; ties keep the earlier one.
fn keep_widest(best: Option<Document>, candidate: Document) -> Option<Document> {
    match best {
        Some(current) if current.len() >= candidate.len() => Some(current),
        _ => Some(candidate),
    }
}

/// One row per field of the representative document.
fn describe_table(document: &Document) -> Table {
    let mut table = Table::new(DESCRIBE_HEADERS);
    for (key, value) in document {
        table.push_values(&[
            Value::String(key.to_uppercase()),
            Value::from(bson_type_name(value)),
        ]);
    }
    table
}

/// Columns are the union of top-level keys in first-seen order.
fn documents_table(documents: &[Document]) -> Table {
    let mut seen = HashSet::new();
    let mut columns: Vec<&str> = Vec::new();
    for key in documents.iter().flat_map(Document::keys) {
        if seen.insert(key.as_str()) {
            columns.push(key);
        }
    }

    let mut table = Table::new(&columns);
    for document in documents {
        let row: Vec<Value> = columns
            .iter()
            .map(|key| document.get(*key).map_or(Value::Null, bson_value))
            .collect();
        table.push_values(&row);
    }
    table
}

fn bson_value(value: &Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::Int(*i),
        Bson::Double(f) => Value::Float(*f),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => Value::String(other.clone().into_relaxed_extjson().to_string()),
    }
}

/// Type names as the shell's `$type` aliases spell them.
fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::JavaScriptCodeWithScope(_) => "javascriptWithScope",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}

fn id_text(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn required<'a>(command: &'a ParsedCommand, index: usize, what: &str) -> Result<&'a str> {
    command.argument(index).ok_or_else(|| {
        TabulaError::query(format!("{} expects {what}", command.function))
    })
}

fn modifier_argument(modifier: &Call) -> Option<&str> {
    modifier.arguments.first().map(String::as_str)
}

fn number_argument(modifier: &Call) -> Result<u64> {
    modifier_argument(modifier)
        .and_then(|arg| arg.parse().ok())
        .ok_or_else(|| {
            TabulaError::query(format!("{} expects a non-negative number", modifier.name))
        })
}

fn parse_bson(argument: &str) -> Result<Bson> {
    let json: serde_json::Value = serde_json::from_str(&shell_to_json(argument))
        .map_err(|e| TabulaError::query(format!("Invalid argument {argument}: {e}")))?;
    Bson::try_from(json).map_err(|e| TabulaError::query(format!("Invalid argument {argument}: {e}")))
}

/// A document argument; a missing or empty one matches everything.
fn document_argument(argument: Option<&str>) -> Result<Document> {
    match argument.map(str::trim) {
        None | Some("") => Ok(Document::new()),
        Some(text) => match parse_bson(text)? {
            Bson::Document(document) => Ok(document),
            _ => Err(TabulaError::query(format!("Expected a document, found: {text}"))),
        },
    }
}

fn documents_argument(argument: &str) -> Result<Vec<Document>> {
    let Bson::Array(items) = parse_bson(argument)? else {
        return Err(TabulaError::query(format!(
            "Expected an array of documents, found: {argument}"
        )));
    };

    items
        .into_iter()
        .map(|item| match item {
            Bson::Document(document) => Ok(document),
            other => Err(TabulaError::query(format!(
                "Expected a document, found: {other}"
            ))),
        })
        .collect()
}

fn query_error(error: mongodb::error::Error) -> TabulaError {
    TabulaError::query(error.to_string())
}
