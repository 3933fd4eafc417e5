//! All tests in this module are intended to test the contract made by the
//! API: status codes, authorization, and what actually reaches the
//! collaborators behind the service.
use std::ops::Deref;
use std::sync::Arc;

use axum_test::TestServer;
use chrono::Utc;
use error_stack::Report;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use mockall::mock;

use classifier::Fixed;
use issues_core::list_filter::IssueFilter;
use issues_core::model::{Category, Issue, IssueId, IssueStatus, NewIssue, Priority};
use issues_core::result::{ImageStoreError, OptRepoResult, RepoResult};
use issues_core::{
    ImagePayload, ImageStore, IssueEngine, IssueRepository, PriorityClassifier, StoredImage,
};

use crate::auth::{AuthConfig, Claims};
use crate::routes;
use crate::state::IssueAppState;


pub(crate) const TEST_SECRET: &str = "contract-test-secret";
pub(crate) const TEST_IMAGE_REF: &str = "/uploads/test-image.jpg";
pub(crate) const FAR_FUTURE_EXP: usize = 4_102_444_800; // 2100-01-01

mock! {
    pub IssueRepo {}

    impl IssueRepository for IssueRepo {
        async fn get(&self, id: IssueId) -> OptRepoResult<Issue>;
        async fn list(&self, filters: Vec<IssueFilter>) -> RepoResult<Vec<Issue>>;
        async fn list_by_reporter(&self, reporter_id: String) -> RepoResult<Vec<Issue>>;
        async fn create(&self, new_issue: NewIssue) -> RepoResult<Issue>;
        async fn update_status(&self, id: IssueId, status: IssueStatus) -> OptRepoResult<Issue>;
        async fn delete(&self, id: IssueId) -> OptRepoResult<()>;
    }
}

#[derive(Clone)]
pub(crate) struct MockRepoWrapper(Arc<MockIssueRepo>);

impl Deref for MockRepoWrapper {
    type Target = MockIssueRepo;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IssueRepository for MockRepoWrapper {
    async fn get(&self, id: IssueId) -> OptRepoResult<Issue> {
        self.0.get(id).await
    }

    async fn list(&self, filters: Vec<IssueFilter>) -> RepoResult<Vec<Issue>> {
        self.0.list(filters).await
    }

    async fn list_by_reporter(&self, reporter_id: String) -> RepoResult<Vec<Issue>> {
        self.0.list_by_reporter(reporter_id).await
    }

    async fn create(&self, new_issue: NewIssue) -> RepoResult<Issue> {
        self.0.create(new_issue).await
    }

    async fn update_status(&self, id: IssueId, status: IssueStatus) -> OptRepoResult<Issue> {
        self.0.update_status(id, status).await
    }

    async fn delete(&self, id: IssueId) -> OptRepoResult<()> {
        self.0.delete(id).await
    }
}

#[derive(Clone)]
pub(crate) enum TestImageStore {
    Stores,
    Fails,
}

impl ImageStore for TestImageStore {
    async fn store(&self, _image: ImagePayload) -> Result<StoredImage, Report<ImageStoreError>> {
        match self {
            TestImageStore::Stores => Ok(StoredImage {
                image_ref: TEST_IMAGE_REF.to_owned(),
            }),
            TestImageStore::Fails => Err(Report::new(ImageStoreError)),
        }
    }
}

#[derive(Clone)]
pub(crate) struct TestEngine<C> {
    repo: MockRepoWrapper,
    classifier: C,
    images: TestImageStore,
}

impl<C> IssueEngine for TestEngine<C>
where
    C: PriorityClassifier + Clone + Send + Sync + 'static,
{
    type Repo = MockRepoWrapper;
    type Classifier = C;
    type Images = TestImageStore;

    fn repo(&self) -> Self::Repo {
        self.repo.clone()
    }

    fn classifier(&self) -> Self::Classifier {
        self.classifier.clone()
    }

    fn images(&self) -> Self::Images {
        self.images.clone()
    }
}

pub(crate) fn server(repo: MockIssueRepo) -> TestServer {
    server_with(repo, Fixed(Priority::Medium), TestImageStore::Stores)
}

pub(crate) fn server_with<C>(
    repo: MockIssueRepo,
    classifier: C,
    images: TestImageStore,
) -> TestServer
where
    C: PriorityClassifier + Clone + Send + Sync + 'static,
{
    let engine = TestEngine {
        repo: MockRepoWrapper(Arc::new(repo)),
        classifier,
        images,
    };
    let state = IssueAppState::new_without_metrics(engine, AuthConfig::new(TEST_SECRET));

    TestServer::new(routes::build(state, std::env::temp_dir())).unwrap()
}

pub(crate) fn citizen_token(sub: &str) -> String {
    mint(sub, "citizen", FAR_FUTURE_EXP)
}

pub(crate) fn admin_token(sub: &str) -> String {
    mint(sub, "admin", FAR_FUTURE_EXP)
}

pub(crate) fn mint(sub: &str, role: &str, exp: usize) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: sub.to_owned(),
            role: role.to_owned(),
            exp,
        },
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub(crate) fn stored_issue(id: &str, reporter: &str, status: IssueStatus) -> Issue {
    Issue {
        id: IssueId::new(id),
        title: "Pothole".into(),
        description: "Large pothole near bus stop".into(),
        category: Category::Roads,
        state: "Delhi".into(),
        location: "MG Road".into(),
        image_ref: TEST_IMAGE_REF.into(),
        status,
        priority: Priority::Medium,
        reporter_id: reporter.into(),
        created: Utc::now(),
        updated: None,
    }
}
