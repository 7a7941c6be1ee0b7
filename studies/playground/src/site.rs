//! Navigation for the portfolio that hosts the playground.

use std::fmt;

use serde::Serialize;

pub const PROJECTS_PATH: &str = "/projects";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "id", rename_all = "kebab-case")]
pub enum Route {
    Home,
    About,
    Experience,
    Projects,
    /// Raw id segment; resolved through `ProjectCatalog::lookup`
    Project(String),
    Blogs,
    Contact,
    MachineLearning,
    NotFound(String),
}

impl Route {
    /// Matches a path, ignoring any query/fragment and a trailing slash.
    pub fn parse(path: &str) -> Route {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Home,
            "/about" => Route::About,
            "/experience" => Route::Experience,
            "/projects" => Route::Projects,
            "/blogs" => Route::Blogs,
            "/contact" => Route::Contact,
            "/machine-learning" => Route::MachineLearning,
            other =>
                match other.strip_prefix("/project/") {
                    Some(id) if !id.is_empty() && !id.contains('/') => Route::Project(id.to_string()),
                    _ => Route::NotFound(path.to_string()),
                }
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::About => "/about".into(),
            Route::Experience => "/experience".into(),
            Route::Projects => PROJECTS_PATH.into(),
            Route::Project(id) => format!("/project/{id}"),
            Route::Blogs => "/blogs".into(),
            Route::Contact => "/contact".into(),
            Route::MachineLearning => "/machine-learning".into(),
            Route::NotFound(path) => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: u32,
    pub name: &'static str,
    pub brief: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum ProjectLookup<'a> {
    Found(&'a Project),
    NotFound { back: &'static str },
}

const PROJECTS: [Project; 5] = [
    Project {
        id: 1,
        name: "All Resume Solutions",
        brief: "An AI-powered tool to optimize and analyze resumes with job matching and grammar checking.",
    },
    Project {
        id: 2,
        name: "Melody Generator AI",
        brief: "A deep learning-based AI that generates music melodies using LSTM, GRU, and Autoencoder models.",
    },
    Project {
        id: 3,
        name: "3D Image Reconstruction",
        brief: "A computer vision project that converts 2D images into 3D models using Open3D and GLPN for depth estimation.",
    },
    Project {
        id: 4,
        name: "Multi-Agent Financial Advisor",
        brief: "An LLM-powered multi-agent system for expense classification, spending recommendations, and investment advisory.",
    },
    Project {
        id: 5,
        name: "Competency-Based AI Tool",
        brief: "An AI-driven platform designed to align nursing school courses with competency-based education standards.",
    },
];

#[derive(Debug, Clone)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl Default for ProjectCatalog {
    fn default() -> Self {
        ProjectCatalog { projects: PROJECTS.to_vec() }
    }
}

impl ProjectCatalog {
    pub fn new() -> ProjectCatalog {
        ProjectCatalog::default()
    }

    pub fn all(&self) -> &[Project] {
        &self.projects
    }

    /// Looks up a raw id segment. Unknown or non-numeric ids lead back to the list.
    pub fn lookup(&self, id: &str) -> ProjectLookup<'_> {
        id.trim()
            .parse::<u32>()
            .ok()
            .and_then(|id| self.projects.iter().find(|p| p.id == id))
            .map_or(ProjectLookup::NotFound { back: PROJECTS_PATH }, ProjectLookup::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/about/"), Route::About);
        assert_eq!(Route::parse("/machine-learning?tab=metrics"), Route::MachineLearning);
        assert_eq!(Route::parse("/project/3"), Route::Project("3".into()));
        assert_eq!(Route::parse("/project/abc"), Route::Project("abc".into()));
    }

    #[test]
    fn test_parse_unknown_routes() {
        assert_eq!(Route::parse("/nope"), Route::NotFound("/nope".into()));
        assert_eq!(Route::parse("/project/"), Route::NotFound("/project/".into()));
        assert_eq!(Route::parse("/project/1/extra"), Route::NotFound("/project/1/extra".into()));
    }

    #[test]
    fn test_route_paths_round_trip() {
        for path in ["/", "/about", "/projects", "/project/2", "/contact", "/machine-learning"] {
            assert_eq!(Route::parse(path).path(), path);
        }
    }

    #[test]
    fn test_project_lookup() {
        let catalog = ProjectCatalog::new();
        assert_eq!(catalog.all().len(), 5);
        match catalog.lookup("2") {
            ProjectLookup::Found(project) => assert_eq!(project.name, "Melody Generator AI"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(catalog.lookup("9"), ProjectLookup::NotFound { back: "/projects" });
        assert_eq!(catalog.lookup("abc"), ProjectLookup::NotFound { back: "/projects" });
        assert_eq!(catalog.lookup("-1"), ProjectLookup::NotFound { back: "/projects" });
    }
}
