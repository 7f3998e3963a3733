//! In-memory persistence handle.
//!
//! The store is constructed once at startup and passed to whatever needs it
//! through [`crate::web::AppState`]. Clones share the same underlying data.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::model::{
    Feedback, FeedbackFilter, FeedbackType, Label, Page, Project, Sentiment, User, WidgetSettings,
};
use crate::util::generate_project_key;
use crate::webhook::generate_secret;

/// Attempts at drawing an unused project key before giving up.
const PROJECT_KEY_ATTEMPTS: usize = 5;

/// Fields supplied when a project is created.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub widget: WidgetSettings,
    pub allowed_domains: Option<String>,
}

/// Partial project update. `allowed_domains: Some(None)` clears the allowlist.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub widget: Option<WidgetSettings>,
    pub allowed_domains: Option<Option<String>>,
}

/// Partial webhook settings update. `webhook_url: Some(None)` clears the URL.
#[derive(Debug, Clone, Default)]
pub struct WebhookUpdate {
    pub webhook_url: Option<Option<String>>,
    pub webhook_enabled: Option<bool>,
}

/// A project together with how much feedback it has collected.
#[derive(Debug, Clone)]
pub struct ProjectStats {
    pub project: Project,
    pub feedback_count: usize,
}

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    projects: HashMap<String, Project>,
    /// Insertion order, oldest first.
    feedback: Vec<Feedback>,
}

impl State {
    fn owned_project_mut(&mut self, project_id: &str, user_id: &str) -> Option<&mut Project> {
        self.projects
            .get_mut(project_id)
            .filter(|p| p.user_id == user_id)
    }

    fn feedback_count(&self, project_id: &str) -> usize {
        self.feedback
            .iter()
            .filter(|f| f.project_id == project_id)
            .count()
    }

    fn key_in_use(&self, key: &str) -> bool {
        self.projects.values().any(|p| p.project_key == key)
    }

    fn feedback_mut(&mut self, feedback_id: &str) -> Option<&mut Feedback> {
        self.feedback.iter_mut().find(|f| f.id == feedback_id)
    }
}

/// Draw project keys until one is free, bounded by [`PROJECT_KEY_ATTEMPTS`].
fn unique_project_key(
    state: &State,
    mut generate: impl FnMut() -> String,
) -> Result<String, AppError> {
    for attempt in 1..=PROJECT_KEY_ATTEMPTS {
        let key = generate();
        if !state.key_in_use(&key) {
            return Ok(key);
        }
        warn!(attempt = attempt, "project_key_collision");
    }
    Err(AppError::Internal(anyhow!(
        "no unused project key after {} attempts",
        PROJECT_KEY_ATTEMPTS
    )))
}

/// Shared handle to all users, projects, feedback and labels.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<State>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Register an account. `None` when the email is already taken.
    pub async fn create_user(&self, email: &str, password_hash: String) -> Option<User> {
        let email = email.trim().to_lowercase();
        let mut state = self.inner.write().await;

        if state.users.values().any(|u| u.email == email) {
            return None;
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id.clone(), user.clone());

        info!(user_id = %user.id, "user_created");

        Some(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        let email = email.trim().to_lowercase();
        let state = self.inner.read().await;
        state.users.values().find(|u| u.email == email).cloned()
    }

    pub async fn get_user(&self, user_id: &str) -> Option<User> {
        let state = self.inner.read().await;
        state.users.get(user_id).cloned()
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub async fn create_project(&self, user_id: &str, input: NewProject) -> Result<Project, AppError> {
        self.create_project_with(user_id, input, generate_project_key)
            .await
    }

    async fn create_project_with(
        &self,
        user_id: &str,
        input: NewProject,
        generate: impl FnMut() -> String,
    ) -> Result<Project, AppError> {
        let mut state = self.inner.write().await;
        let project_key = unique_project_key(&state, generate)?;

        let project = Project {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: input.name,
            project_key,
            created_at: Utc::now(),
            widget: input.widget,
            allowed_domains: input.allowed_domains,
            webhook_url: None,
            webhook_secret: None,
            webhook_enabled: false,
        };

        state.projects.insert(project.id.clone(), project.clone());

        info!(project_id = %project.id, user_id = %user_id, "project_created");

        Ok(project)
    }

    /// A user's projects, newest first.
    pub async fn list_projects(&self, user_id: &str) -> Vec<ProjectStats> {
        let state = self.inner.read().await;

        let mut projects: Vec<ProjectStats> = state
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| ProjectStats {
                project: p.clone(),
                feedback_count: state.feedback_count(&p.id),
            })
            .collect();

        projects.sort_by(|a, b| b.project.created_at.cmp(&a.project.created_at));
        projects
    }

    /// Fetch a project only if `user_id` owns it.
    pub async fn get_project(&self, project_id: &str, user_id: &str) -> Option<ProjectStats> {
        let state = self.inner.read().await;

        state
            .projects
            .get(project_id)
            .filter(|p| p.user_id == user_id)
            .map(|p| ProjectStats {
                project: p.clone(),
                feedback_count: state.feedback_count(&p.id),
            })
    }

    /// Public lookup used by widget submissions.
    pub async fn get_project_by_key(&self, project_key: &str) -> Option<Project> {
        let state = self.inner.read().await;
        state
            .projects
            .values()
            .find(|p| p.project_key == project_key)
            .cloned()
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        user_id: &str,
        update: ProjectUpdate,
    ) -> Option<Project> {
        let mut state = self.inner.write().await;
        let project = state.owned_project_mut(project_id, user_id)?;

        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(widget) = update.widget {
            project.widget = widget;
        }
        if let Some(allowed_domains) = update.allowed_domains {
            project.allowed_domains = allowed_domains;
        }

        Some(project.clone())
    }

    /// Delete a project along with its feedback and labels.
    pub async fn delete_project(&self, project_id: &str, user_id: &str) -> bool {
        let mut state = self.inner.write().await;

        if state.owned_project_mut(project_id, user_id).is_none() {
            return false;
        }

        state.projects.remove(project_id);
        let before = state.feedback.len();
        state.feedback.retain(|f| f.project_id != project_id);

        info!(
            project_id = %project_id,
            feedback_deleted = before - state.feedback.len(),
            "project_deleted"
        );

        true
    }

    /// Replace a project's public key. Existing embed snippets stop working.
    pub async fn regenerate_project_key(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<Project>, AppError> {
        let mut state = self.inner.write().await;

        if state.owned_project_mut(project_id, user_id).is_none() {
            return Ok(None);
        }

        let key = unique_project_key(&state, generate_project_key)?;
        let project = match state.owned_project_mut(project_id, user_id) {
            Some(p) => p,
            None => return Ok(None),
        };
        project.project_key = key;

        info!(project_id = %project_id, "project_key_regenerated");

        Ok(Some(project.clone()))
    }

    // =========================================================================
    // Webhook settings
    // =========================================================================

    /// Apply webhook settings. The first time a non-empty URL is set on a
    /// project without a secret, a secret is generated; clearing the URL
    /// keeps the secret.
    pub async fn update_webhook(
        &self,
        project_id: &str,
        user_id: &str,
        update: WebhookUpdate,
    ) -> Option<Project> {
        let mut state = self.inner.write().await;
        let project = state.owned_project_mut(project_id, user_id)?;

        if let Some(url) = update.webhook_url {
            let url = url.filter(|u| !u.trim().is_empty());
            if url.is_some() && project.webhook_secret.is_none() {
                project.webhook_secret = Some(generate_secret());
                info!(project_id = %project_id, "webhook_secret_created");
            }
            project.webhook_url = url;
        }

        if let Some(enabled) = update.webhook_enabled {
            project.webhook_enabled = enabled;
        }

        Some(project.clone())
    }

    pub async fn regenerate_webhook_secret(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Option<Project> {
        let mut state = self.inner.write().await;
        let project = state.owned_project_mut(project_id, user_id)?;

        project.webhook_secret = Some(generate_secret());

        info!(project_id = %project_id, "webhook_secret_regenerated");

        Some(project.clone())
    }

    // =========================================================================
    // Feedback
    // =========================================================================

    /// Record a submission. `None` when the project no longer exists, so a
    /// submission racing a project deletion never leaves orphaned feedback.
    pub async fn insert_feedback(
        &self,
        project_id: &str,
        kind: FeedbackType,
        message: String,
    ) -> Option<Feedback> {
        let mut state = self.inner.write().await;
        if !state.projects.contains_key(project_id) {
            return None;
        }

        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            kind,
            message,
            sentiment: None,
            created_at: Utc::now(),
            labels: Vec::new(),
        };
        state.feedback.push(feedback.clone());

        Some(feedback)
    }

    /// One page of a project's feedback, newest first.
    pub async fn list_feedback(&self, project_id: &str, filter: &FeedbackFilter) -> Page<Feedback> {
        let state = self.inner.read().await;

        let matching: Vec<&Feedback> = state
            .feedback
            .iter()
            .rev()
            .filter(|f| f.project_id == project_id && filter.kind.matches(f.kind))
            .collect();

        let total = matching.len();
        let data = matching
            .into_iter()
            .skip(filter.offset())
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Page::new(data, filter, total)
    }

    /// Every feedback entry of a project, newest first.
    pub async fn export_feedback(&self, project_id: &str) -> Vec<Feedback> {
        let state = self.inner.read().await;
        state
            .feedback
            .iter()
            .rev()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Fetch feedback together with its project, only if `user_id` owns the project.
    pub async fn find_owned_feedback(
        &self,
        feedback_id: &str,
        user_id: &str,
    ) -> Option<(Feedback, Project)> {
        let state = self.inner.read().await;
        let feedback = state.feedback.iter().find(|f| f.id == feedback_id)?;
        let project = state
            .projects
            .get(&feedback.project_id)
            .filter(|p| p.user_id == user_id)?;
        Some((feedback.clone(), project.clone()))
    }

    pub async fn set_sentiment(&self, feedback_id: &str, sentiment: Sentiment) -> Option<Feedback> {
        let mut state = self.inner.write().await;
        let feedback = state.feedback_mut(feedback_id)?;
        feedback.sentiment = Some(sentiment);
        Some(feedback.clone())
    }

    /// Remove a feedback entry and its labels, returning what was removed.
    pub async fn delete_feedback(&self, feedback_id: &str) -> Option<Feedback> {
        let mut state = self.inner.write().await;
        let index = state.feedback.iter().position(|f| f.id == feedback_id)?;
        Some(state.feedback.remove(index))
    }

    // =========================================================================
    // Labels
    // =========================================================================

    pub async fn add_label(&self, feedback_id: &str, label: String) -> Option<Label> {
        let mut state = self.inner.write().await;
        let feedback = state.feedback_mut(feedback_id)?;

        let label = Label {
            id: Uuid::new_v4().to_string(),
            label,
            created_at: Utc::now(),
        };
        feedback.labels.insert(0, label.clone());

        Some(label)
    }

    /// Labels on a feedback entry, newest first.
    pub async fn list_labels(&self, feedback_id: &str) -> Vec<Label> {
        let state = self.inner.read().await;
        state
            .feedback
            .iter()
            .find(|f| f.id == feedback_id)
            .map(|f| f.labels.clone())
            .unwrap_or_default()
    }

    pub async fn remove_label(&self, feedback_id: &str, label_id: &str) -> bool {
        let mut state = self.inner.write().await;
        match state.feedback_mut(feedback_id) {
            Some(feedback) => {
                let before = feedback.labels.len();
                feedback.labels.retain(|l| l.id != label_id);
                feedback.labels.len() != before
            }
            None => false,
        }
    }
}
