//! Prometheus text exposition of project statistics
//!
//! Every project renders as a block of lines keyed by `repo="<path>"`, where
//! the namespaced path has each `/` replaced by `___`.

use std::fmt::{Display, Write};

use compact_str::CompactString;

use crate::domain::{MergeRequest, Project};

const PATH_SEPARATOR: &str = "/";
const PATH_REPLACEMENT: &str = "___";

/// Turns a namespaced path into a label value; idempotent.
pub fn normalize_path(path: &str) -> CompactString {
    path.replace(PATH_SEPARATOR, PATH_REPLACEMENT).into()
}

/// Append-only builder for metric lines
#[derive(Debug, Default)]
pub struct MetricsText {
    buffer: String,
}

impl MetricsText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name{labels} value\n`
    pub fn line(&mut self, name: &str, labels: &[(&str, &str)], value: impl Display) -> &mut Self {
        self.buffer.push_str(name);
        self.buffer.push('{');
        for (i, (key, label_value)) in labels.iter().enumerate() {
            if i > 0 {
                self.buffer.push_str(", ");
            }
            self.buffer.push_str(key);
            self.buffer.push_str("=\"");
            push_escaped(&mut self.buffer, label_value);
            self.buffer.push('"');
        }
        // writing into a String cannot fail
        let _ = writeln!(self.buffer, "}} {value}");
        self
    }

    pub fn project(&mut self, project: &Project) -> &mut Self {
        let repo = normalize_path(&project.path_with_namespace);
        let labels = [("repo", repo.as_str())];
        let stats = &project.statistics;

        self.line("gitlab_project_stars", &labels, project.star_count)
            .line("gitlab_project_forks", &labels, project.fork_count)
            .line("gitlab_project_commit_count", &labels, stats.commit_count)
            .line("gitlab_project_storage_size", &labels, stats.storage_size)
            .line("gitlab_project_repository_size", &labels, stats.repository_size)
            .line("gitlab_project_lfs_object_size", &labels, stats.lfs_objects_size)
            .line("gitlab_project_job_artifacts_size", &labels, stats.job_artifacts_size);

        for merge_request in &project.merge_requests {
            self.merge_request(&repo, merge_request);
        }

        self.line(
            "gitlab_project_last_activity",
            &labels,
            project.last_activity_at.timestamp(),
        )
    }

    fn merge_request(&mut self, repo: &str, merge_request: &MergeRequest) -> &mut Self {
        self.line(
            "gitlab_project_merge_request",
            &[
                ("repo", repo),
                ("state", merge_request.state.as_str()),
                ("merge_status", merge_request.merge_status.as_str()),
                ("target_branch", merge_request.target_branch.as_str()),
            ],
            1,
        )
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Renders all projects in collection order
pub fn render_projects(projects: &[Project]) -> String {
    projects
        .iter()
        .fold(MetricsText::new(), |mut text, project| {
            text.project(project);
            text
        })
        .finish()
}

fn push_escaped(buffer: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => buffer.push_str("\\\\"),
            '"' => buffer.push_str("\\\""),
            '\n' => buffer.push_str("\\n"),
            c => buffer.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::{domain::Statistics, id::ProjectId};

    fn timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    fn project(path: &str) -> Project {
        Project {
            id: ProjectId::new(42),
            path_with_namespace: path.into(),
            star_count: 5,
            fork_count: 1,
            open_issues_count: 2,
            last_activity_at: timestamp("2023-01-01T00:00:00Z"),
            statistics: Statistics {
                commit_count: 10,
                storage_size: 4096,
                repository_size: 2048,
                lfs_objects_size: 1024,
                job_artifacts_size: 512,
            },
            merge_requests: Vec::new(),
        }
    }

    fn merge_request(state: &str, target_branch: &str) -> MergeRequest {
        MergeRequest {
            title: "Add feature".into(),
            state: state.into(),
            merge_status: "can_be_merged".into(),
            target_branch: target_branch.into(),
            created_at: timestamp("2023-01-01T00:00:00Z"),
            updated_at: timestamp("2023-01-02T00:00:00Z"),
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("group/sub/repo"), "group___sub___repo");
        assert_eq!(normalize_path("repo"), "repo");
        assert_eq!(normalize_path("a//b"), "a______b");
    }

    #[test]
    fn test_normalize_path_is_idempotent() {
        let once = normalize_path("group/sub/deeper/repo");
        let twice = normalize_path(&once);

        assert_eq!(once, "group___sub___deeper___repo");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_render_project() {
        let project = project("group/sub/repo")
            .with_merge_requests(vec![merge_request("opened", "main")]);

        let expected = "\
gitlab_project_stars{repo=\"group___sub___repo\"} 5
gitlab_project_forks{repo=\"group___sub___repo\"} 1
gitlab_project_commit_count{repo=\"group___sub___repo\"} 10
gitlab_project_storage_size{repo=\"group___sub___repo\"} 4096
gitlab_project_repository_size{repo=\"group___sub___repo\"} 2048
gitlab_project_lfs_object_size{repo=\"group___sub___repo\"} 1024
gitlab_project_job_artifacts_size{repo=\"group___sub___repo\"} 512
gitlab_project_merge_request{repo=\"group___sub___repo\", state=\"opened\", merge_status=\"can_be_merged\", target_branch=\"main\"} 1
gitlab_project_last_activity{repo=\"group___sub___repo\"} 1672531200
";

        assert_eq!(render_projects(std::slice::from_ref(&project)), expected);
    }

    #[test]
    fn test_merge_request_lines_keep_page_order() {
        let project = project("g/r").with_merge_requests(vec![
            merge_request("opened", "main"),
            merge_request("merged", "develop"),
            merge_request("closed", "release"),
        ]);

        let rendered = render_projects(std::slice::from_ref(&project));
        let branches: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with("gitlab_project_merge_request"))
            .map(|line| line.split("target_branch=\"").nth(1).unwrap())
            .collect();

        assert_eq!(branches, ["main\"} 1", "develop\"} 1", "release\"} 1"]);
        assert!(rendered.lines().last().unwrap().starts_with("gitlab_project_last_activity"));
    }

    #[test]
    fn test_render_projects_concatenates_in_order() {
        let projects = vec![project("a/one"), project("b/two")];
        let rendered = render_projects(&projects);

        assert_eq!(rendered.lines().count(), 16);
        assert!(rendered.starts_with("gitlab_project_stars{repo=\"a___one\"} 5\n"));
        assert!(rendered.ends_with("gitlab_project_last_activity{repo=\"b___two\"} 1672531200\n"));
    }

    #[test]
    fn test_render_no_projects() {
        assert_eq!(render_projects(&[]), "");
    }

    #[test]
    fn test_label_values_are_escaped() {
        let mut text = MetricsText::new();
        text.line("m", &[("target_branch", "fix\"quote\\slash")], 1);

        assert_eq!(text.finish(), "m{target_branch=\"fix\\\"quote\\\\slash\"} 1\n");
    }
}
