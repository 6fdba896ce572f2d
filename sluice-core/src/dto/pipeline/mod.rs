//! Pipeline DTOs for the data collector API

use serde::{Deserialize, Serialize};

use crate::domain::pipeline::PipelineInfo;
use crate::domain::status::PipelineState;

/// Column the pipeline list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortColumn {
    Name,
    Title,
    LastModified,
    Created,
    Creator,
    Status,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Name => "NAME",
            SortColumn::Title => "TITLE",
            SortColumn::LastModified => "LAST_MODIFIED",
            SortColumn::Created => "CREATED",
            SortColumn::Creator => "CREATOR",
            SortColumn::Status => "STATUS",
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "NAME" => Ok(SortColumn::Name),
            "TITLE" => Ok(SortColumn::Title),
            "LAST_MODIFIED" => Ok(SortColumn::LastModified),
            "CREATED" => Ok(SortColumn::Created),
            "CREATOR" => Ok(SortColumn::Creator),
            "STATUS" => Ok(SortColumn::Status),
            other => Err(format!("unknown sort column `{}`", other)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse { SortOrder::Desc } else { SortOrder::Asc }
    }
}

/// Query parameters of the paginated pipeline listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPipelines {
    pub filter_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub offset: usize,
    pub len: usize,
    pub order_by: SortColumn,
    pub order: SortOrder,
    pub include_status: bool,
}

/// One page of the pipeline listing
///
/// `total_count` is the number of pipelines matching the filter on the
/// server, not the length of `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelinePage {
    pub items: Vec<PipelineInfo>,
    pub statuses: Vec<PipelineState>,
    pub total_count: usize,
}

/// Response of the pipeline count endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineCount {
    pub count: usize,
}

/// Request to add labels to several pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLabels {
    pub labels: Vec<String>,
    pub pipeline_names: Vec<String>,
}

/// Request to publish pipelines to the remote control hub
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPipelines {
    pub pipeline_names: Vec<String>,
    pub commit_message: String,
}

/// Options for duplicating a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateOptions {
    /// Title of the copy; numbered when more than one copy is made
    pub title: String,
    pub count: u32,
}

impl DuplicateOptions {
    /// A single copy titled "<title> copy"
    pub fn single_copy_of(pipeline: &PipelineInfo) -> Self {
        Self {
            title: format!("{} copy", pipeline.display_title()),
            count: 1,
        }
    }
}
