use crate::recipe::{Artifact, BuildDependency, Recipe, Tool};

/// Extraction root of archives that do not name one.
const DEFAULT_EXTRACT_ROOT: &str = "/usr/local/bin";
const BINARY_DIR: &str = "/usr/local/bin";
const LINE_BREAK: &str = " \\\n\t";

/// Users the official base images do not ship and the Dockerfile must create.
const CREATED_USERS: &[&str] = &["web"];

/// Renders a resolved [`Recipe`] as a Dockerfile.
///
/// Blocks are emitted in a fixed order and separated by one blank line.
/// Blocks with nothing to say are left out.
pub struct DockerfileGenerator<'a> {
    recipe: &'a Recipe,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(recipe: &'a Recipe) -> Self {
        Self { recipe }
    }

    pub fn render(&self) -> String {
        let recipe = self.recipe;
        let mut blocks = vec![format!("FROM {}", recipe.image())];

        blocks.extend(self.packages());
        blocks.extend(recipe.tools.iter().filter_map(download));
        blocks.extend(recipe.dependencies.iter().map(dependency));
        blocks.extend(self.env());
        blocks.extend(self.user());
        blocks.push(format!("WORKDIR {}/", self.workdir()));
        blocks.extend(recipe.tools.iter().filter_map(|t| self.tool_steps(t)));
        blocks.extend(self.cmd());

        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }

    fn workdir(&self) -> &str {
        self.recipe.workdir.trim_end_matches('/')
    }

    fn packages(&self) -> Option<String> {
        let recipe = self.recipe;
        if recipe.packages.is_empty() {
            return None;
        }

        let mut steps = vec!["RUN set -ex".to_string()];
        for source in &recipe.apt_sources {
            steps.push(format!(
                "&& echo \"{}\" > /etc/apt/sources.list.d/{}",
                source.entry, source.file
            ));
            steps.push(format!("&& curl -fsSL {} | apt-key add -", source.key_url));
        }
        steps.push("&& apt-get update && apt-get install -y".to_string());
        for package in &recipe.packages {
            steps.push(format!("\t{}", package));
        }
        steps.push("&& rm -rf /var/lib/apt/lists/*".to_string());
        Some(steps.join(LINE_BREAK))
    }

    fn env(&self) -> Option<String> {
        if self.recipe.env.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .recipe
            .env
            .iter()
            .map(|(key, value)| format!("ENV {}={}", key, value))
            .collect();
        Some(lines.join("\n"))
    }

    fn user(&self) -> Option<String> {
        let user = self.recipe.user.as_str();
        if user.is_empty() {
            return None;
        }

        let workdir = self.workdir();
        let mut steps = Vec::new();
        if CREATED_USERS.contains(&user) {
            steps.push(format!("useradd --create-home {}", user));
        }
        steps.push(format!("mkdir -p {} && chown {}:{} {}", workdir, user, user, workdir));

        Some(format!(
            "RUN {}\nUSER {}",
            steps.join(&format!("{}&& ", LINE_BREAK)),
            user
        ))
    }

    fn tool_steps(&self, tool: &Tool) -> Option<String> {
        if tool.is_idle() {
            return None;
        }

        let chown = if self.recipe.user.is_empty() {
            String::new()
        } else {
            format!("--chown={}:{} ", self.recipe.user, self.recipe.user)
        };

        let mut lines: Vec<String> = tool
            .copy
            .iter()
            .map(|(dir, files)| {
                let dest = if dir.is_empty() {
                    format!("{}/", self.workdir())
                } else {
                    format!("{}/{}/", self.workdir(), dir)
                };
                format!("COPY {}{} {}", chown, files.join(" "), dest)
            })
            .collect();

        if !tool.install.is_empty() {
            let commands: Vec<String> = tool
                .install
                .iter()
                .map(|arg| {
                    if tool.name.is_empty() {
                        arg.clone()
                    } else {
                        format!("{} {}", tool.name, arg)
                    }
                })
                .collect();
            lines.push(format!("RUN {}", commands.join(&format!("{}&& ", LINE_BREAK))));
        }
        Some(lines.join("\n"))
    }

    fn cmd(&self) -> Option<String> {
        if self.recipe.process.is_empty() {
            return None;
        }
        let args: Vec<String> = self
            .recipe
            .process
            .iter()
            .map(|arg| serde_json::Value::from(arg.as_str()).to_string())
            .collect();
        Some(format!("CMD [{}]", args.join(", ")))
    }
}

fn download(tool: &Tool) -> Option<String> {
    let name = &tool.name;
    match &tool.artifact {
        Artifact::None => None,
        Artifact::Archive { url, extract_to } => {
            let root = extract_to.as_deref().unwrap_or(DEFAULT_EXTRACT_ROOT);
            Some(
                [
                    format!("RUN wget -O {}.tar.gz \"{}\"", name, url),
                    format!("&& tar -xzf {}.tar.gz -C {} --strip-components=1", name, root),
                    format!("&& rm {}.tar.gz", name),
                ]
                .join(LINE_BREAK),
            )
        }
        Artifact::RawBinary { url } => Some(
            [
                format!("RUN wget -O {} \"{}\"", name, url),
                format!("&& chmod +x {} && mv {} {}", name, name, BINARY_DIR),
            ]
            .join(LINE_BREAK),
        ),
        Artifact::ShellCommand { command } => Some(format!("RUN {}", command)),
    }
}

fn dependency(dep: &BuildDependency) -> String {
    match dep {
        BuildDependency::Compound { prefix, commands } => {
            let commands: Vec<String> = commands
                .iter()
                .map(|c| match prefix {
                    Some(prefix) => format!("{} {}", prefix, c),
                    None => c.clone(),
                })
                .collect();
            format!("RUN {}", commands.join(&format!("{}&& ", LINE_BREAK)))
        }
        BuildDependency::Listed { command, args } => {
            let mut run = format!("RUN {}", command);
            for arg in args {
                run.push_str(LINE_BREAK);
                run.push_str(arg);
            }
            run
        }
    }
}
