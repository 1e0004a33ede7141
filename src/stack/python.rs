use super::Stack;
use crate::error::Result;
use crate::fs::ProjectTree;
use crate::recipe::{Recipe, Tool};
use std::collections::HashSet;

const USER: &str = "web";

/// Manifests listing requirements, in lookup order.
const MANIFESTS: &[&str] = &["requirements.txt", "setup.py", "environment.yml", "Pipfile"];

/// Files that may pin the interpreter version, in lookup order.
const VERSION_FILES: &[&str] = &["runtime.txt", "environment.yml", "Pipfile"];

cached_regex!(
    requirement_regex,
    r#"(?:^|[-'"])\s*([a-zA-Z_][-\w]*)\s*(?:$|[=<>'"\[])"#
);
cached_regex!(
    wsgi_app_regex,
    r"(\w+)\s*=\s*[\w.]*(Flask|get_wsgi_application)\("
);
cached_regex!(
    python_version_regex,
    r#"^-?\s*python(_version)?[-=\s'"]*([.x*\d]+)['"]?$"#
);

/// Python web apps served by gunicorn.
pub struct PythonStack<'a> {
    tree: &'a ProjectTree,
}

impl<'a> PythonStack<'a> {
    pub fn new(tree: &'a ProjectTree) -> Self {
        Self { tree }
    }

    /// Package names mentioned by the first manifest present.
    fn requirements(&self) -> HashSet<String> {
        let Some(manifest) = MANIFESTS.iter().find(|m| self.tree.exists(m)) else {
            return HashSet::new();
        };

        self.tree
            .lines(manifest)
            .unwrap_or_default()
            .iter()
            .filter_map(|line| requirement_regex().captures(line))
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Tool that turns a non-pip manifest into `requirements.txt`.
    fn converter(&self) -> Option<Tool> {
        if self.tree.exists("requirements.txt") {
            None
        } else if self.tree.exists("setup.py") {
            Some(
                Tool::new("pip-compile")
                    .with_shell("pip install pip-tools")
                    .with_files(["setup.py"])
                    .with_install(["setup.py"]),
            )
        } else if self.tree.exists("environment.yml") {
            let convert = [
                "r environment.yml dependencies[*]",
                "sed 's/=/==/;/^python=/d' > requirements.txt",
            ];
            Some(
                Tool::new("yq")
                    .with_owner("mikefarah")
                    .with_files(["environment.yml"])
                    .with_install([convert.join(" | ")]),
            )
        } else if self.tree.exists("Pipfile") {
            Some(
                Tool::new("pipenv")
                    .with_shell("pip install pipenv")
                    .with_files(["Pipfile", "Pipfile.lock"])
                    .with_install(["lock -r > requirements.txt"]),
            )
        } else {
            None
        }
    }
}

impl Stack for PythonStack<'_> {
    fn detect(&self) -> bool {
        MANIFESTS.iter().any(|m| self.tree.exists(m))
    }

    fn partial_recipe(&self) -> Recipe {
        let mut recipe = Recipe {
            user: USER.to_string(),
            ..Recipe::default()
        };
        recipe.set_env("PATH", format!("/home/{}/.local/bin:$PATH", USER));
        recipe.set_env("PIP_USER", "true");

        let requirements = self.requirements();
        if !requirements.contains("gunicorn") {
            recipe
                .tools
                .push(Tool::new("pip").with_install(["install gunicorn"]));
        }
        if requirements.contains("pylibmc") {
            recipe.packages.push("libmemcached-dev".to_string());
        }

        recipe.tools.extend(self.converter());
        recipe.tools.push(
            Tool::new("pip")
                .with_files(["requirements.txt"])
                .with_install(["install -r requirements.txt"]),
        );
        recipe
    }

    fn name(&self) -> String {
        "python".to_string()
    }

    /// `gunicorn module:app` for the first module creating a Flask or Django
    /// WSGI application.
    fn start_command(&self) -> Result<String> {
        for path in self.tree.glob("**/*.py")? {
            let Ok(lines) = self.tree.lines(&path) else {
                continue;
            };
            let Some(caps) = lines.iter().find_map(|l| wsgi_app_regex().captures(l)) else {
                continue;
            };

            let module = path.strip_suffix(".py").unwrap_or(&path).replace('/', ".");
            return Ok(format!("gunicorn {}:{}", module, &caps[1]));
        }
        Ok(String::new())
    }

    fn version_constraint(&self) -> Result<String> {
        for file in VERSION_FILES {
            let Some(content) = self.tree.read_optional(file)? else {
                continue;
            };
            if let Some(caps) = content
                .lines()
                .find_map(|l| python_version_regex().captures(l))
            {
                return Ok(caps[2].to_string());
            }
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::sync::Arc;

    fn tree(files: &[(&str, &str)]) -> ProjectTree {
        let fs = MockFileSystem::new();
        for (path, content) in files {
            fs.add_file(path, content);
        }
        ProjectTree::new(Arc::new(fs), "/mock")
    }

    #[test]
    fn test_detect() {
        for manifest in MANIFESTS {
            assert!(PythonStack::new(&tree(&[(*manifest, "")])).detect());
        }
        assert!(!PythonStack::new(&tree(&[("app.py", "")])).detect());
    }

    #[test]
    fn test_requirements_txt() {
        let tree = tree(&[("requirements.txt", "Flask==3.0.0\npylibmc>=1.6\n")]);
        let recipe = PythonStack::new(&tree).partial_recipe();

        assert_eq!(recipe.tool_names(), vec!["pip", "pip"]);
        assert_eq!(recipe.tools[0].install, vec!["install gunicorn"]);
        assert!(recipe.tools[0].files.is_empty());
        assert_eq!(recipe.tools[1].files, vec!["requirements.txt"]);
        assert_eq!(recipe.packages, vec!["libmemcached-dev"]);
        assert_eq!(recipe.user, "web");
        assert_eq!(recipe.env["PIP_USER"], "true");
        assert_eq!(recipe.env["PATH"], "/home/web/.local/bin:$PATH");
    }

    #[test]
    fn test_gunicorn_already_required() {
        let tree = tree(&[("requirements.txt", "django\ngunicorn==21.2.0\n")]);
        let recipe = PythonStack::new(&tree).partial_recipe();

        assert_eq!(recipe.tool_names(), vec!["pip"]);
        assert!(recipe.packages.is_empty());
    }

    #[test]
    fn test_setup_py_uses_pip_compile() {
        let tree = tree(&[(
            "setup.py",
            "setup(\n    name='fibo',\n    install_requires=[\n        'flask',\n        'gunicorn',\n    ],\n)\n",
        )]);
        let recipe = PythonStack::new(&tree).partial_recipe();

        assert_eq!(recipe.tool_names(), vec!["pip-compile", "pip"]);
        assert_eq!(
            recipe.tools[0].artifact,
            crate::recipe::Artifact::ShellCommand {
                command: "pip install pip-tools".to_string()
            }
        );
    }

    #[test]
    fn test_environment_yml_uses_yq() {
        let tree = tree(&[(
            "environment.yml",
            "dependencies:\n  - python=3.8\n  - flask=1.1\n",
        )]);
        let recipe = PythonStack::new(&tree).partial_recipe();

        let yq = &recipe.tools[1];
        assert_eq!(yq.name, "yq");
        assert_eq!(yq.owner, "mikefarah");
        assert_eq!(
            yq.install,
            vec!["r environment.yml dependencies[*] | sed 's/=/==/;/^python=/d' > requirements.txt"]
        );
    }

    #[test]
    fn test_pipfile_uses_pipenv() {
        let tree = tree(&[("Pipfile", "[packages]\nflask = \"*\"\n")]);
        let recipe = PythonStack::new(&tree).partial_recipe();
        assert_eq!(recipe.tool_names(), vec!["pip", "pipenv", "pip"]);
    }

    #[test]
    fn test_flask_start_command() {
        let tree = tree(&[
            ("requirements.txt", "flask\n"),
            ("scripts/run_service.py", "import os\napp = flask.Flask(__name__)\n"),
        ]);
        assert_eq!(
            PythonStack::new(&tree).start_command().unwrap(),
            "gunicorn scripts.run_service:app"
        );
    }

    #[test]
    fn test_django_start_command() {
        let tree = tree(&[
            ("requirements.txt", "django\n"),
            ("mysite/wsgi.py", "application = get_wsgi_application()\n"),
        ]);
        assert_eq!(
            PythonStack::new(&tree).start_command().unwrap(),
            "gunicorn mysite.wsgi:application"
        );
    }

    #[test]
    fn test_no_wsgi_app() {
        let tree = tree(&[("requirements.txt", ""), ("main.py", "print('hi')\n")]);
        assert_eq!(PythonStack::new(&tree).start_command().unwrap(), "");
    }

    #[test]
    fn test_version_from_runtime_txt() {
        let tree = tree(&[("requirements.txt", ""), ("runtime.txt", "python-3.11.4\n")]);
        assert_eq!(PythonStack::new(&tree).version_constraint().unwrap(), "3.11.4");
    }

    #[test]
    fn test_version_from_environment_yml() {
        let tree = tree(&[("environment.yml", "dependencies:\n- python=3.8.x\n")]);
        assert_eq!(PythonStack::new(&tree).version_constraint().unwrap(), "3.8.x");
    }

    #[test]
    fn test_version_from_pipfile() {
        let tree = tree(&[("Pipfile", "[requires]\npython_version = \"3.10\"\n")]);
        assert_eq!(PythonStack::new(&tree).version_constraint().unwrap(), "3.10");
    }
}
