use crate::grid::{CellView, GridController, Mutation, OrderingPolicy, Reaction};
use crate::models::{CellKey, UpdateRequest, UpdateResponse};
use reqwest::Client;
use std::fmt;

/// Client-side failure taxonomy is deliberately coarse: the request did not
/// complete, or the response was not the expected shape. Both surface as the
/// same alert.
#[derive(Debug)]
pub enum SyncError {
    Request(reqwest::Error),
    UnexpectedShape(reqwest::Error),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Request(err) => write!(f, "attendance update failed: {err}"),
            SyncError::UnexpectedShape(err) => {
                write!(f, "attendance update response unreadable: {err}")
            }
        }
    }
}

impl std::error::Error for SyncError {}

/// Thin HTTP client for the league server's attendance endpoints.
#[derive(Debug, Clone)]
pub struct AttendanceClient {
    http: Client,
    base_url: String,
}

impl AttendanceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub async fn send(&self, request: &UpdateRequest) -> Result<UpdateResponse, SyncError> {
        let response = self
            .http
            .post(format!("{}/attendance/update", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(SyncError::Request)?
            .error_for_status()
            .map_err(SyncError::Request)?;

        response.json().await.map_err(SyncError::UnexpectedShape)
    }

    /// Kick off TBA re-verification for every bowler. The caller reloads the
    /// page on success; the response body is of no interest.
    pub async fn verify_tba(&self) -> Result<(), SyncError> {
        self.http
            .post(format!("{}/bowlers/verify-tba", self.base_url))
            .send()
            .await
            .map_err(SyncError::Request)?
            .error_for_status()
            .map_err(SyncError::Request)?;
        Ok(())
    }
}

/// A grid controller wired to a live server: every gesture redraws
/// optimistically, sends the update, and reconciles the response. No retry,
/// no rollback on failure.
#[derive(Debug)]
pub struct GridSession {
    grid: GridController,
    client: AttendanceClient,
}

impl GridSession {
    pub fn new(client: AttendanceClient, ordering: OrderingPolicy) -> Self {
        Self {
            grid: GridController::new(ordering),
            client,
        }
    }

    pub fn grid(&self) -> &GridController {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridController {
        &mut self.grid
    }

    pub async fn primary_click(&mut self, key: CellKey) -> (CellView, Reaction) {
        let mutation = self.grid.primary_click(key);
        self.settle(mutation).await
    }

    pub async fn secondary_click(&mut self, key: CellKey) -> (CellView, Reaction) {
        let mutation = self.grid.secondary_click(key);
        self.settle(mutation).await
    }

    pub async fn fix(&mut self, key: CellKey) -> Option<(CellView, Reaction)> {
        let mutation = self.grid.fix(key)?;
        Some(self.settle(mutation).await)
    }

    pub async fn commit_edit(&mut self, key: CellKey, raw: &str) -> (CellView, Reaction) {
        let mutation = self.grid.commit_edit(key, raw);
        self.settle(mutation).await
    }

    async fn settle(&mut self, mutation: Mutation) -> (CellView, Reaction) {
        let Mutation {
            key,
            seq,
            view,
            request,
        } = mutation;
        let reaction = match self.client.send(&request).await {
            Ok(response) => self.grid.reconcile_success(key.bowler_id, seq, &response),
            Err(_) => self.grid.reconcile_failure(),
        };
        (view, reaction)
    }
}
