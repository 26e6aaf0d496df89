//! Build targets derived from the project configuration.
//!
//! Every component gets a `build`, `lint` and `run` target per profile, named
//! `<verb>_<profile>_<component>`. Each verb also gets `<verb>_<profile>_all`
//! and `<verb>_all` composites. `clean` and `docs` run their configured
//! commands as-is.
use std::rc::Rc;

use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

use crate::{
    command::Command,
    config::{ComponentConfig, Config, ProfileConfig},
    error::RegistryError,
    process::Runner,
    target::{Target, TargetRegistry, TargetRegistryBuilder, sequence},
};

/// Build configuration of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Profile {
    /// Unoptimised build with debug information.
    Dev,
    /// Optimised build without assertions.
    Rel,
}

impl Profile {
    /// Word used in target descriptions.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Dev => "develop",
            Self::Rel => "release",
        }
    }

    fn settings<'a>(&self, config: &'a Config) -> &'a ProfileConfig {
        match self {
            Self::Dev => &config.profiles.dev,
            Self::Rel => &config.profiles.rel,
        }
    }
}

/// What a per-component target does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Verb {
    /// Compile the component.
    Build,
    /// Run the static analyser over the component.
    Lint,
    /// Execute the compiled component.
    Run,
}

/// A configured project plus the runner its targets execute commands with.
pub struct Project {
    config: Config,
    runner: Rc<dyn Runner>,
}

impl Project {
    /// Wraps `config`; commands are executed through `runner`.
    pub fn new(config: Config, runner: Rc<dyn Runner>) -> Rc<Self> {
        Rc::new(Self { config, runner })
    }

    /// The underlying configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the binary produced for `component` in `profile`.
    pub fn output_path(&self, profile: Profile, component: &ComponentConfig) -> String {
        format!(
            "{}/{}_{}_{}",
            self.config.build_dir.trim_end_matches('/'),
            self.config.project,
            profile,
            component.name
        )
    }

    /// Compiler invocation for `component` in `profile`.
    pub fn compiler_command(&self, profile: Profile, component: &ComponentConfig) -> Command {
        let compiler = &self.config.compiler;
        let mut command = Command::new();
        command
            .arg(&compiler.program)
            .args(&compiler.flags)
            .args(&profile.settings(&self.config).compiler_flags)
            .args(["-o".to_string(), self.output_path(profile, component)]);
        self.append_inputs(&mut command, component);
        command
    }

    /// Linter invocation for `component` in `profile`.
    pub fn linter_command(&self, profile: Profile, component: &ComponentConfig) -> Command {
        let linter = &self.config.linter;
        let mut command = Command::new();
        command
            .arg(&linter.program)
            .args(&linter.flags)
            .args(&profile.settings(&self.config).linter_flags);
        self.append_inputs(&mut command, component);
        command
    }

    /// Defines, common sources, include directories and component sources,
    /// in that order.
    fn append_inputs(&self, command: &mut Command, component: &ComponentConfig) {
        for define in &self.config.defines {
            command.args(["-D", define.as_str()]);
        }
        command.args(&self.config.common_sources);
        for include in &component.includes {
            command.args(["-I", include.as_str()]);
        }
        command.args(&component.sources);
    }

    fn execute(&self, command: &Command) -> bool {
        self.runner.run_sync(command).is_ok()
    }

    fn build(&self, profile: Profile, component: &ComponentConfig) -> bool {
        let mut command = Command::new();
        command.args(["mkdir", "-p", self.config.build_dir.as_str()]);
        if !self.execute(&command) {
            return false;
        }

        command.clear();
        command.args(self.compiler_command(profile, component).tokens());
        self.execute(&command)
    }

    fn lint(&self, profile: Profile, component: &ComponentConfig) -> bool {
        self.execute(&self.linter_command(profile, component))
    }

    fn run(&self, profile: Profile, component: &ComponentConfig) -> bool {
        let command: Command = [self.output_path(profile, component)].into_iter().collect();
        self.execute(&command)
    }

    fn perform(&self, verb: Verb, profile: Profile, index: usize) -> bool {
        let component = &self.config.components[index];
        debug!("{verb} {} ({profile})", component.name);
        match verb {
            Verb::Build => self.build(profile, component),
            Verb::Lint => self.lint(profile, component),
            Verb::Run => self.run(profile, component),
        }
    }

    fn configured(&self, tokens: &[String]) -> bool {
        let command: Command = tokens.iter().cloned().collect();
        self.execute(&command)
    }

    /// Builds the registry of every project target in usage order.
    pub fn registry(self: &Rc<Self>) -> Result<TargetRegistry, RegistryError> {
        let project = Rc::clone(self);
        let mut builder = TargetRegistry::builder().target(
            "clean",
            "clean the project and remove the build directory with all its artefacts.",
            move || project.configured(&project.config.clean),
        );

        builder = self.register_verb(builder, Verb::Build);
        builder = self.register_verb(builder, Verb::Lint);

        let project = Rc::clone(self);
        builder = builder.target(
            "docs",
            "generate the docs for the project.",
            move || project.configured(&project.config.docs),
        );

        builder = self.register_verb(builder, Verb::Run);
        builder.build()
    }

    fn register_verb(
        self: &Rc<Self>,
        mut builder: TargetRegistryBuilder,
        verb: Verb,
    ) -> TargetRegistryBuilder {
        let components = &self.config.components;
        let mut leaves: Vec<(Profile, Target)> = Vec::new();

        for (index, component) in components.iter().enumerate() {
            for profile in Profile::iter() {
                let project = Rc::clone(self);
                let target = Target::new(
                    format!("{verb}_{profile}_{}", component.name),
                    format!(
                        "{verb} the {} {} in the {} configuration.",
                        self.config.project,
                        component.name,
                        profile.description()
                    ),
                    move || project.perform(verb, profile, index),
                );
                leaves.push((profile, target));
            }
        }

        for (_, target) in &leaves {
            builder = builder.with(target.clone());
        }

        let every_component = join_names(components.iter().map(|c| c.name.as_str()));
        let mut profile_composites = Vec::new();
        for profile in Profile::iter() {
            let parts = leaves
                .iter()
                .filter(|(leaf_profile, _)| *leaf_profile == profile)
                .map(|(_, target)| target.clone())
                .collect();
            let composite = Target::new(
                format!("{verb}_{profile}_all"),
                format!(
                    "{verb} the {} {every_component} in the {} configuration.",
                    self.config.project,
                    profile.description()
                ),
                sequence(parts),
            );
            profile_composites.push(composite);
        }

        builder = builder.with_all(&profile_composites);

        let every_profile = join_names(Profile::iter().map(|profile| profile.description()));
        builder.target(
            format!("{verb}_all"),
            format!(
                "{verb} the {} {every_component} in the {every_profile} configurations.",
                self.config.project
            ),
            sequence(profile_composites),
        )
    }
}

/// Joins names as `a`, `a and b`, or `a, b and c`.
fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => last.to_string(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}
