//! Offline technology-stack detection over a sample of fetched files.
//!
//! Languages come from file extensions; frameworks and tools come from
//! well-known manifests. Detection never fails: a manifest that does not
//! parse falls back to substring matching.

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::walker::FetchedFiles;

/// Detected languages, frameworks and tools; each list sorted and deduplicated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    /// Languages seen in file extensions
    pub languages: Vec<String>,
    /// Frameworks named by manifests
    pub frameworks: Vec<String>,
    /// Package managers, build and deployment tools
    pub tools: Vec<String>,
}

impl TechStack {
    /// One-line description naming at most two languages and two frameworks,
    /// e.g. `Built with Python, Rust. using Axum.`
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.languages.is_empty() {
            parts.push(format!("Built with {}", first_two(&self.languages)));
        }
        if !self.frameworks.is_empty() {
            parts.push(format!("using {}", first_two(&self.frameworks)));
        }
        if parts.is_empty() {
            return "Software application.".to_string();
        }
        format!("{}.", parts.join(". "))
    }
}

fn first_two(items: &[String]) -> String {
    items.iter().take(2).map(String::as_str).collect::<Vec<_>>().join(", ")
}

const LANGUAGES: &[(&[&str], &str)] = &[
    (&["py"], "Python"),
    (&["js", "jsx", "mjs", "cjs"], "JavaScript"),
    (&["ts", "tsx"], "TypeScript"),
    (&["java"], "Java"),
    (&["go"], "Go"),
    (&["rb"], "Ruby"),
    (&["c", "cpp", "cc", "h", "hpp"], "C/C++"),
    (&["rs"], "Rust"),
    (&["kt"], "Kotlin"),
    (&["swift"], "Swift"),
    (&["php"], "PHP"),
    (&["cs"], "C#"),
    (&["scala"], "Scala"),
];

const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("streamlit", "Streamlit"),
];

const RUST_FRAMEWORKS: &[(&str, &str)] = &[
    ("tokio", "Tokio"),
    ("axum", "Axum"),
    ("actix-web", "Actix Web"),
    ("rocket", "Rocket"),
];

#[derive(Default)]
struct Accumulator {
    languages: BTreeSet<String>,
    frameworks: BTreeSet<String>,
    tools: BTreeSet<String>,
}

impl Accumulator {
    fn language(&mut self, name: &str) {
        self.languages.insert(name.to_string());
    }

    fn framework(&mut self, name: &str) {
        self.frameworks.insert(name.to_string());
    }

    fn tool(&mut self, name: &str) {
        self.tools.insert(name.to_string());
    }

    fn finish(self) -> TechStack {
        TechStack {
            languages: self.languages.into_iter().collect(),
            frameworks: self.frameworks.into_iter().collect(),
            tools: self.tools.into_iter().collect(),
        }
    }
}

/// Detects the technology stack of a file sample
///
/// The result depends only on the set of (path, content) pairs, never on
/// their order.
pub fn detect(files: &FetchedFiles) -> TechStack {
    let mut acc = Accumulator::default();

    for path in files.paths() {
        if let Some(language) = language_for(path) {
            acc.language(language);
        }
    }

    let mut saw_package_json = false;
    for file in files.iter() {
        let name = basename(&file.path).to_lowercase();
        let content = file.content.as_str();

        match name.as_str() {
            "package.json" => {
                saw_package_json = true;
                detect_node(content, &mut acc);
            }
            "requirements.txt" | "requirements.in" => {
                acc.tool("pip");
                match_signatures(&content.to_lowercase(), PYTHON_FRAMEWORKS, &mut acc);
            }
            "pyproject.toml" => detect_pyproject(content, &mut acc),
            "docker-compose.yml" | "docker-compose.yaml" => acc.tool("Docker Compose"),
            "cargo.toml" => detect_cargo(content, &mut acc),
            "go.mod" => {
                acc.tool("Go Modules");
                if content.contains("gin-gonic/gin") {
                    acc.framework("Gin");
                }
            }
            "pom.xml" => {
                acc.tool("Maven");
                if content.contains("spring-boot") {
                    acc.framework("Spring Boot");
                }
            }
            "build.gradle" | "build.gradle.kts" => {
                acc.tool("Gradle");
                if content.contains("spring-boot") {
                    acc.framework("Spring Boot");
                }
            }
            "makefile" => acc.tool("Make"),
            _ if name.starts_with("dockerfile") => acc.tool("Docker"),
            _ => {}
        }

        if file.path.contains(".github/workflows") {
            acc.tool("GitHub Actions");
        }
    }

    if saw_package_json && !acc.languages.contains("JavaScript") && !acc.languages.contains("TypeScript") {
        acc.language("JavaScript");
    }

    acc.finish()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn language_for(path: &str) -> Option<&'static str> {
    let name = basename(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(exts, _)| exts.contains(&ext.as_str()))
        .map(|(_, language)| *language)
}

fn match_signatures(haystack: &str, signatures: &[(&str, &str)], acc: &mut Accumulator) {
    for (needle, framework) in signatures {
        if haystack.contains(needle) {
            acc.framework(framework);
        }
    }
}

fn detect_node(content: &str, acc: &mut Accumulator) {
    acc.tool("npm");

    let manifest: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(_) => {
            for (needle, framework) in [
                ("\"react\"", "React"),
                ("@types/react", "React"),
                ("\"next\"", "Next.js"),
                ("\"vue\"", "Vue.js"),
                ("\"express\"", "Express"),
            ] {
                if content.contains(needle) {
                    acc.framework(framework);
                }
            }
            return;
        }
    };

    let deps: BTreeSet<&str> = ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(|v| v.as_object()))
        .flat_map(|section| section.keys().map(String::as_str))
        .collect();

    if deps.contains("react") || deps.contains("@types/react") {
        acc.framework("React");
    }
    if deps.contains("next") {
        acc.framework("Next.js");
    }
    if deps.contains("vue") {
        acc.framework("Vue.js");
    }
    if deps.contains("express") {
        acc.framework("Express");
    }
    if deps.iter().any(|dep| dep.contains("angular")) {
        acc.framework("Angular");
    }
    if deps.contains("svelte") {
        acc.framework("Svelte");
    }
}

fn detect_pyproject(content: &str, acc: &mut Accumulator) {
    let manifest: toml::Value = match toml::from_str(content) {
        Ok(value) => value,
        Err(_) => {
            acc.tool("pip");
            match_signatures(&content.to_lowercase(), PYTHON_FRAMEWORKS, acc);
            return;
        }
    };

    let poetry = manifest.get("tool").and_then(|tool| tool.get("poetry"));
    acc.tool(if poetry.is_some() { "Poetry" } else { "pip" });

    let mut names: Vec<String> = Vec::new();
    if let Some(deps) = manifest
        .get("project")
        .and_then(|project| project.get("dependencies"))
        .and_then(|deps| deps.as_array())
    {
        names.extend(deps.iter().filter_map(|dep| dep.as_str()).map(str::to_lowercase));
    }
    if let Some(deps) = poetry
        .and_then(|poetry| poetry.get("dependencies"))
        .and_then(|deps| deps.as_table())
    {
        names.extend(deps.keys().map(|name| name.to_lowercase()));
    }

    match_signatures(&names.join("\n"), PYTHON_FRAMEWORKS, acc);
}

fn detect_cargo(content: &str, acc: &mut Accumulator) {
    acc.tool("Cargo");

    let manifest: toml::Value = match toml::from_str(content) {
        Ok(value) => value,
        Err(_) => {
            match_signatures(content, RUST_FRAMEWORKS, acc);
            return;
        }
    };

    let deps: BTreeSet<&str> = ["dependencies", "dev-dependencies"]
        .iter()
        .filter_map(|section| manifest.get(section).and_then(|v| v.as_table()))
        .flat_map(|table| table.keys().map(String::as_str))
        .collect();

    for (krate, framework) in RUST_FRAMEWORKS {
        if deps.contains(krate) {
            acc.framework(framework);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn files(entries: &[(&str, &str)]) -> FetchedFiles {
        entries.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test_case("main.py", Some("Python") ; "python")]
    #[test_case("web/App.JSX", Some("JavaScript") ; "uppercase extension")]
    #[test_case("src/index.tsx", Some("TypeScript") ; "tsx")]
    #[test_case("native/lib.hpp", Some("C/C++") ; "header")]
    #[test_case("src/lib.rs", Some("Rust") ; "rust")]
    #[test_case("README", None ; "no extension")]
    #[test_case(".gitignore", None ; "dotfile")]
    #[test_case("notes.txt", None ; "unknown extension")]
    fn test_language_for(path: &str, expected: Option<&str>) {
        assert_eq!(language_for(path), expected);
    }

    #[test]
    fn test_node_project() {
        let stack = detect(&files(&[
            ("src/App.tsx", "export default 1"),
            (
                "package.json",
                r#"{"dependencies": {"react": "^18", "next": "14"}, "devDependencies": {"@angular/cli": "1"}}"#,
            ),
        ]));

        assert_eq!(stack.languages, strings(&["TypeScript"]));
        assert_eq!(stack.frameworks, strings(&["Angular", "Next.js", "React"]));
        assert_eq!(stack.tools, strings(&["npm"]));
    }

    #[test]
    fn test_package_json_implies_javascript() {
        let stack = detect(&files(&[("package.json", r#"{"dependencies": {"express": "4"}}"#)]));
        assert_eq!(stack.languages, strings(&["JavaScript"]));
        assert_eq!(stack.frameworks, strings(&["Express"]));
    }

    #[test]
    fn test_python_app_with_react_frontend() {
        let stack = detect(&files(&[
            ("app.py", "print('hi')"),
            ("package.json", r#"{"dependencies":{"react":"18"}}"#),
        ]));
        assert_eq!(stack.languages, strings(&["JavaScript", "Python"]));
        assert!(stack.frameworks.contains(&"React".to_string()));
    }

    #[test]
    fn test_malformed_package_json_falls_back_to_substrings() {
        let stack = detect(&files(&[("package.json", r#"{"dependencies": {"vue": "3", "#)]));
        assert_eq!(stack.frameworks, strings(&["Vue.js"]));
    }

    #[test]
    fn test_python_and_tooling() {
        let stack = detect(&files(&[
            ("app/main.py", "import fastapi"),
            ("requirements.txt", "FastAPI==0.110\nuvicorn\nDjango>=4"),
            ("Dockerfile", "FROM python:3.12"),
            ("docker-compose.yml", "services: {}"),
            (".github/workflows/ci.yml", "on: push"),
            ("Makefile", "test:\n\tpytest"),
        ]));

        assert_eq!(stack.languages, strings(&["Python"]));
        assert_eq!(stack.frameworks, strings(&["Django", "FastAPI"]));
        assert_eq!(stack.tools, strings(&["Docker", "Docker Compose", "GitHub Actions", "Make", "pip"]));
    }

    #[test]
    fn test_pyproject_poetry() {
        let pyproject = "[tool.poetry]\nname = \"x\"\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nFlask = \"^3\"\n";
        let stack = detect(&files(&[("pyproject.toml", pyproject)]));
        assert_eq!(stack.frameworks, strings(&["Flask"]));
        assert_eq!(stack.tools, strings(&["Poetry"]));
    }

    #[test]
    fn test_cargo_manifest() {
        let cargo = "[package]\nname = \"svc\"\n\n[dependencies]\ntokio = { version = \"1\" }\naxum = \"0.7\"\n";
        let stack = detect(&files(&[("Cargo.toml", cargo), ("src/main.rs", "fn main() {}")]));
        assert_eq!(stack.languages, strings(&["Rust"]));
        assert_eq!(stack.frameworks, strings(&["Axum", "Tokio"]));
        assert_eq!(stack.tools, strings(&["Cargo"]));
    }

    #[test]
    fn test_jvm_and_go_manifests() {
        let stack = detect(&files(&[
            ("pom.xml", "<artifactId>spring-boot-starter-web</artifactId>"),
            ("svc/go.mod", "require github.com/gin-gonic/gin v1.9.1"),
            ("android/build.gradle.kts", "plugins {}"),
        ]));
        assert_eq!(stack.frameworks, strings(&["Gin", "Spring Boot"]));
        assert_eq!(stack.tools, strings(&["Go Modules", "Gradle", "Maven"]));
    }

    #[test]
    fn test_detection_ignores_order() {
        let forward = files(&[("a.py", "x"), ("package.json", "{}"), ("Cargo.toml", "[dependencies]\nrocket = \"0.5\"")]);
        let reverse = files(&[("Cargo.toml", "[dependencies]\nrocket = \"0.5\""), ("package.json", "{}"), ("a.py", "x")]);
        assert_eq!(detect(&forward), detect(&reverse));
    }

    #[test]
    fn test_describe() {
        assert_eq!(TechStack::default().describe(), "Software application.");
        let stack = TechStack {
            languages: strings(&["Go", "Python", "Shell"]),
            frameworks: strings(&["Gin"]),
            tools: strings(&["Docker"]),
        };
        assert_eq!(stack.describe(), "Built with Go, Python. using Gin.");
    }
}
