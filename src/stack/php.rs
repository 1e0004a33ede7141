use super::Stack;
use crate::error::Result;
use crate::fs::ProjectTree;
use crate::recipe::{BuildDependency, Recipe, Tool};
use crate::util::paths;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

const WORKDIR: &str = "/var/www";
const USER: &str = "www-data";
const VARIANT: &str = "apache";

const PHP_IMAP: &str = "--with-kerberos --with-imap-ssl";
const PHP_ODBC: &str = "--with-pdo-odbc=unixODBC,/usr";

/// Bundled extensions: OS packages (comma separated) and optional configure
/// flags.
const PHP_CORE_EXTS: &[(&str, &[&str])] = &[
    ("bz2", &["libbz2-dev"]),
    ("curl", &["libcurl4-openssl-dev"]),
    ("dba", &[]),
    ("enchant", &["libenchant-*dev"]),
    ("exif", &[]),
    ("fileinfo", &[]),
    ("ftp", &["libssl-dev"]),
    ("gd", &["libpng-dev"]),
    ("gettext", &[]),
    ("gmp", &["libgmp-dev"]),
    ("imap", &["libc-client-dev,libkrb5-dev", PHP_IMAP]),
    ("intl", &["libicu-dev"]),
    ("ldap", &["libldap2-dev"]),
    ("mbstring", &["libonig-dev"]),
    ("mysqli", &[]),
    ("pcntl", &[]),
    ("pdo", &[]),
    ("pdo_firebird", &["firebird-dev"]),
    ("pdo_mysql", &[]),
    ("pdo_odbc", &["unixodbc-dev", PHP_ODBC]),
    ("pdo_pgsql", &["libpq-dev"]),
    ("pdo_sqlite", &["libsqlite3-dev"]),
    ("pgsql", &["libpq-dev"]),
    ("pspell", &["libpspell-dev"]),
    ("shmop", &[]),
    ("snmp", &["libsnmp-dev"]),
    ("soap", &["libxml2-dev"]),
    ("sockets", &[]),
    ("sysvmsg", &[]),
    ("sysvsem", &[]),
    ("sysvshm", &[]),
    ("tidy", &["libtidy-dev"]),
    ("xsl", &["libxslt1-dev"]),
    ("zip", &["libzip-dev"]),
];

/// PECL extensions: OS packages (comma separated) and optional version pin.
const PHP_PECL_EXTS: &[(&str, &[&str])] = &[
    ("amqp", &["librabbitmq-dev"]),
    ("apcu", &[]),
    ("igbinary", &[]),
    ("imagick", &["libmagickwand-dev"]),
    ("lzf", &[]),
    ("mailparse", &[]),
    ("maxminddb", &["libmaxminddb-dev"]),
    ("mcrypt", &["libmcrypt-dev"]),
    ("memcached", &["libmemcached-dev"]),
    ("mongodb", &[]),
    ("msgpack", &[]),
    ("oauth", &["libpcre3-dev"]),
    ("protobuf", &[]),
    ("psr", &[]),
    ("rdkafka", &["librdkafka-dev"]),
    ("redis", &[]),
    ("solr", &["libcurl4-openssl-dev,libxml2-dev"]),
    ("stomp", &["libssl-dev"]),
    ("yaf", &[]),
    ("yaml", &["libyaml-dev"]),
];

const APACHE_SETUP: &[&str] = &[
    "ln -s php.ini-production $PHP_INI_DIR/php.ini",
    "a2enmod rewrite && chown www-data:www-data /var/www",
    "echo 'ServerName localhost' >> /etc/apache2/apache2.conf",
    "echo 'DocumentRoot ${APACHE_ROOT}' >> /etc/apache2/apache2.conf",
    "echo ': ${PORT:=3000}\\nexport PORT' >> /etc/apache2/envvars",
    "sed -i 's/^Listen.*/Listen ${PORT}/' /etc/apache2/ports.conf",
];

cached_regex!(front_controller_regex, r"^require.*index\.php");
cached_regex!(pipe_regex, r"\|+");

fn lookup(table: &[(&str, &'static [&'static str])], ext: &str) -> Option<&'static [&'static str]> {
    table.iter().find(|(name, _)| *name == ext).map(|(_, args)| *args)
}

/// Build steps derived from `ext-*` requirements.
#[derive(Debug, Default, PartialEq, Eq)]
struct Extensions {
    configure: Vec<String>,
    core: Vec<String>,
    enable: Vec<String>,
    pecl: Vec<String>,
    packages: Vec<String>,
}

/// PHP served by Apache, with Composer when a `composer.json` exists.
pub struct PhpStack<'a> {
    tree: &'a ProjectTree,
}

impl<'a> PhpStack<'a> {
    pub fn new(tree: &'a ProjectTree) -> Self {
        Self { tree }
    }

    fn read_json(&self, file: &str) -> Option<Value> {
        let content = self.tree.read_optional(file).ok().flatten()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Ignoring unparsable {}: {}", file, e);
                None
            }
        }
    }

    /// Every package requirement reachable from `composer.json`, with
    /// differing constraints on the same package merged with `,`.
    fn requires(&self) -> BTreeMap<String, String> {
        let mut locked: HashMap<String, Map<String, Value>> = HashMap::new();
        if let Some(lock) = self.read_json("composer.lock") {
            for package in lock["packages"].as_array().into_iter().flatten() {
                if let (Some(name), Some(require)) =
                    (package["name"].as_str(), package["require"].as_object())
                {
                    locked.insert(name.to_string(), require.clone());
                }
            }
        }

        let mut requires = BTreeMap::new();
        let Some(manifest) = self.read_json("composer.json") else {
            return requires;
        };

        for (name, constraint) in manifest["require"].as_object().into_iter().flatten() {
            if let Some(constraint) = constraint.as_str() {
                requires.insert(name.clone(), constraint.to_string());
                Self::require_locked(name, &locked, &mut requires);
            }
        }
        requires
    }

    fn require_locked(
        name: &str,
        locked: &HashMap<String, Map<String, Value>>,
        requires: &mut BTreeMap<String, String>,
    ) {
        let Some(require) = locked.get(name) else {
            return;
        };

        for (dep, constraint) in require {
            let Some(constraint) = constraint.as_str() else {
                continue;
            };
            match requires.get_mut(dep) {
                None => {
                    requires.insert(dep.clone(), constraint.to_string());
                    Self::require_locked(dep, locked, requires);
                }
                Some(existing) if !existing.contains(constraint) => {
                    existing.push(',');
                    existing.push_str(constraint);
                }
                Some(_) => {}
            }
        }
    }

    fn extensions(&self, requires: &BTreeMap<String, String>) -> Extensions {
        let mut exts = Extensions::default();
        let mut packages = BTreeSet::new();

        // BTreeMap keys are already sorted.
        for ext in requires.keys().filter_map(|r| r.strip_prefix("ext-")) {
            let args = if let Some(args) = lookup(PHP_CORE_EXTS, ext) {
                exts.core.push(ext.to_string());
                if let Some(flags) = args.get(1) {
                    exts.configure.push(format!("{} {}", ext, flags));
                }
                args
            } else if let Some(args) = lookup(PHP_PECL_EXTS, ext) {
                exts.enable.push(ext.to_string());
                match args.get(1) {
                    Some(pin) => exts.pecl.push(format!("{}-{}", ext, pin)),
                    None => exts.pecl.push(ext.to_string()),
                }
                args
            } else {
                continue;
            };

            if let Some(list) = args.first() {
                packages.extend(list.split(',').map(str::to_string));
            }
        }

        exts.packages = packages.into_iter().collect();
        exts
    }

    /// Directory of the shallowest `index.php` that is not a front controller
    /// shim requiring another `index.php`.
    fn webroot(&self) -> String {
        let mut candidates = match self.tree.glob("**/index.php") {
            Ok(paths) if !paths.is_empty() => paths,
            _ => return String::new(),
        };
        candidates.sort_by_key(|p| p.matches('/').count());

        for path in &candidates {
            let Ok(lines) = self.tree.lines(path) else {
                continue;
            };
            if !lines.iter().any(|l| front_controller_regex().is_match(l)) {
                return paths::parent_dir(path);
            }
        }
        paths::parent_dir(&candidates[0])
    }
}

impl Stack for PhpStack<'_> {
    fn detect(&self) -> bool {
        self.tree.exists("composer.json") || self.tree.exists("index.php")
    }

    fn partial_recipe(&self) -> Recipe {
        let mut recipe = Recipe {
            workdir: WORKDIR.to_string(),
            user: USER.to_string(),
            variant: VARIANT.to_string(),
            ..Recipe::default()
        };
        recipe.dependencies.push(BuildDependency::Compound {
            prefix: None,
            commands: APACHE_SETUP.iter().map(|s| s.to_string()).collect(),
        });
        recipe.set_env(
            "APACHE_ROOT",
            format!("{}/", paths::join(WORKDIR, &self.webroot())),
        );

        if !self.tree.exists("composer.json") {
            return recipe;
        }

        let exts = self.extensions(&self.requires());
        if !exts.configure.is_empty() {
            recipe.dependencies.push(BuildDependency::Compound {
                prefix: Some("docker-php-ext-configure".to_string()),
                commands: exts.configure,
            });
        }
        if !exts.core.is_empty() {
            recipe.dependencies.push(BuildDependency::Listed {
                command: "docker-php-ext-install".to_string(),
                args: exts.core,
            });
        }
        if !exts.pecl.is_empty() {
            recipe.dependencies.push(BuildDependency::Listed {
                command: "pecl install".to_string(),
                args: exts.pecl,
            });
            recipe.dependencies.push(BuildDependency::Listed {
                command: "docker-php-ext-enable".to_string(),
                args: exts.enable,
            });
        }

        recipe.packages = exts.packages;
        recipe
            .packages
            .extend(["git", "wget", "zip"].map(String::from));
        recipe.tools.push(
            Tool::new("composer")
                .with_owner("composer")
                .with_files(["composer.json", "composer.lock"])
                .with_install(["install --no-dev --no-scripts"]),
        );
        recipe
    }

    fn name(&self) -> String {
        "php".to_string()
    }

    fn start_command(&self) -> Result<String> {
        Ok(String::new())
    }

    fn version_constraint(&self) -> Result<String> {
        let requires = self.requires();
        let php = requires.get("php").map(String::as_str).unwrap_or_default();
        Ok(pipe_regex().split(php).collect::<Vec<_>>().join("||"))
    }
}
