use bson::oid::ObjectId;
use bson::{Document, doc};
use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Database};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::debug;

use issues_core::IssueRepository;
use issues_core::list_filter::IssueFilter;
use issues_core::model::{Category, Issue, IssueId, IssueStatus, NewIssue, Priority};
use issues_core::result::{IssueRepoError, OptRepoResult, RepoResult};

pub enum ConnectionDetails {
    Url(String),
}

#[derive(Debug, thiserror::Error)]
#[error("failed to create client connection to mongodb instance")]
pub struct ConnectError;

#[derive(Debug, Serialize, Deserialize)]
struct MongoIssue {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    description: String,
    category: Category,
    state: String,
    location: String,
    image_ref: String,
    status: IssueStatus,
    priority: Priority,
    reporter_id: String,
    created: DateTime<Utc>,
    updated: Option<DateTime<Utc>>,
}

impl From<MongoIssue> for Issue {
    fn from(value: MongoIssue) -> Self {
        Self {
            id: IssueId::new(value.id.to_hex()),
            title: value.title,
            description: value.description,
            category: value.category,
            state: value.state,
            location: value.location,
            image_ref: value.image_ref,
            status: value.status,
            priority: value.priority,
            reporter_id: value.reporter_id,
            created: value.created,
            updated: value.updated,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewIssueCreated {
    title: String,
    description: String,
    category: Category,
    state: String,
    location: String,
    image_ref: String,
    status: IssueStatus,
    priority: Priority,
    reporter_id: String,
    created: DateTime<Utc>,
}

impl NewIssueCreated {
    fn new(new_issue: NewIssue, created: DateTime<Utc>) -> Self {
        Self {
            title: new_issue.draft.title,
            description: new_issue.draft.description,
            category: new_issue.draft.category,
            state: new_issue.draft.state,
            location: new_issue.draft.location,
            image_ref: new_issue.image_ref,
            status: IssueStatus::Pending,
            priority: new_issue.priority,
            reporter_id: new_issue.reporter_id,
            created,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssueRepo {
    db: Database,
}

const ISSUES_DB_NAME: &str = "govconnect";
const ISSUES_COLLECTION_NAME: &str = "issues";

impl IssueRepo {
    pub fn new(client: Client) -> Self {
        Self {
            db: client.database(ISSUES_DB_NAME),
        }
    }

    pub async fn init(
        connection_details: ConnectionDetails,
    ) -> Result<IssueRepo, Report<ConnectError>> {
        let client = match connection_details {
            ConnectionDetails::Url(url) => Client::with_uri_str(url)
                .await
                .change_context(ConnectError)?,
        };

        Ok(Self {
            db: client.database(ISSUES_DB_NAME),
        })
    }
}

/// Malformed ids cannot name a stored document, so they read as not-found
/// rather than as errors.
fn parse_object_id(id: &IssueId) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

fn newest_first() -> Document {
    doc! { "created": -1 }
}

fn filter_document(filters: &[IssueFilter]) -> Document {
    let mut document = Document::new();

    for filter in filters {
        match filter {
            IssueFilter::Status(status) => {
                document.insert("status", status.as_str());
            }
            IssueFilter::Category(category) => {
                document.insert("category", category.as_str());
            }
            IssueFilter::Search(text) => {
                let pattern = regex::escape(text);
                let clauses = ["title", "location", "state"]
                    .map(|field| doc! { field: { "$regex": &pattern, "$options": "i" } });
                document.insert("$or", clauses.to_vec());
            }
        }
    }

    document
}

impl IssueRepository for IssueRepo {
    async fn get(&self, id: IssueId) -> OptRepoResult<Issue> {
        let Some(object_id) = parse_object_id(&id) else {
            return Ok(None);
        };

        self.db
            .collection::<MongoIssue>(ISSUES_COLLECTION_NAME)
            .find_one(doc! { "_id": object_id })
            .await
            .change_context(IssueRepoError::Get)
            .map(|i| i.map(From::from))
    }

    async fn list(&self, filters: Vec<IssueFilter>) -> RepoResult<Vec<Issue>> {
        let options = FindOptions::builder().sort(newest_first()).build();

        self.db
            .collection::<MongoIssue>(ISSUES_COLLECTION_NAME)
            .find(filter_document(&filters))
            .with_options(options)
            .await
            .change_context(IssueRepoError::List)?
            .map(|i| i.map(From::from))
            .collect::<Result<_, _>>()
            .await
            .change_context(IssueRepoError::List)
    }

    async fn list_by_reporter(&self, reporter_id: String) -> RepoResult<Vec<Issue>> {
        let options = FindOptions::builder().sort(newest_first()).build();

        self.db
            .collection::<MongoIssue>(ISSUES_COLLECTION_NAME)
            .find(doc! { "reporter_id": reporter_id })
            .with_options(options)
            .await
            .change_context(IssueRepoError::List)?
            .map(|i| i.map(From::from))
            .collect::<Result<_, _>>()
            .await
            .change_context(IssueRepoError::List)
    }

    async fn create(&self, new_issue: NewIssue) -> RepoResult<Issue> {
        let created = Utc::now();
        let issue = NewIssueCreated::new(new_issue, created);

        let result = self
            .db
            .collection::<NewIssueCreated>(ISSUES_COLLECTION_NAME)
            .insert_one(&issue)
            .await
            .change_context(IssueRepoError::Create)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or(IssueRepoError::Create)
            .attach("inserted id was not an ObjectId")?;

        debug!("persisted new issue {}", id.to_hex());

        Ok(Issue {
            id: IssueId::new(id.to_hex()),
            title: issue.title,
            description: issue.description,
            category: issue.category,
            state: issue.state,
            location: issue.location,
            image_ref: issue.image_ref,
            status: issue.status,
            priority: issue.priority,
            reporter_id: issue.reporter_id,
            created,
            updated: None,
        })
    }

    async fn update_status(&self, id: IssueId, status: IssueStatus) -> OptRepoResult<Issue> {
        let Some(object_id) = parse_object_id(&id) else {
            return Ok(None);
        };

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.db
            .collection::<MongoIssue>(ISSUES_COLLECTION_NAME)
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! { "$set": { "status": status.as_str(), "updated": Utc::now().to_rfc3339() } },
            )
            .with_options(options)
            .await
            .change_context(IssueRepoError::UpdateStatus)
            .map(|i| i.map(From::from))
    }

    async fn delete(&self, id: IssueId) -> OptRepoResult<()> {
        let Some(object_id) = parse_object_id(&id) else {
            return Ok(None);
        };

        let result = self
            .db
            .collection::<MongoIssue>(ISSUES_COLLECTION_NAME)
            .delete_one(doc! { "_id": object_id })
            .await
            .change_context(IssueRepoError::Delete)?;

        Ok((result.deleted_count > 0).then_some(()))
    }
}
