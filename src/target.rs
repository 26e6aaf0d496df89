//! Named units of work and the registry that holds them.
use std::{fmt, io, rc::Rc};

use tracing::warn;

use crate::{buffer::GrowableBuffer, error::RegistryError};

/// Something that can be invoked as a build step.
///
/// Returns `true` on success. Any `Fn() -> bool` is an invoker.
pub trait Invoke {
    /// Runs the step.
    fn invoke(&self) -> bool;
}

impl<F: Fn() -> bool> Invoke for F {
    fn invoke(&self) -> bool {
        self()
    }
}

/// A named, described, invokable unit of work.
#[derive(Clone)]
pub struct Target {
    name: String,
    description: String,
    invoker: Rc<dyn Invoke>,
}

impl Target {
    /// Creates a target from any invoker.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        invoker: impl Invoke + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            invoker: Rc::new(invoker),
        }
    }

    /// Unique name used as the command-line selector.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description shown in the usage banner.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Invoke for Target {
    fn invoke(&self) -> bool {
        self.invoker.invoke()
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Composes `parts` into one invoker that runs them in order and stops at the
/// first failure.
pub fn sequence(parts: Vec<Target>) -> impl Fn() -> bool + 'static {
    move || parts.iter().all(|part| part.invoke())
}

/// Ordered collection of targets with unique names.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: GrowableBuffer<Target>,
}

impl TargetRegistry {
    /// Starts a new registry builder.
    pub fn builder() -> TargetRegistryBuilder {
        TargetRegistryBuilder::default()
    }

    /// Targets in registration order.
    pub fn targets(&self) -> &[Target] {
        self.targets.as_slice()
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Looks up a target by its full name.
    pub fn find(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|target| target.name == name)
    }

    /// Writes the usage banner for `program` to `out`.
    pub fn usage<W: io::Write>(&self, out: &mut W, program: &str) -> io::Result<()> {
        writeln!(out, "usage: {program} [options] <targets...>")?;
        writeln!(out, "options:")?;
        writeln!(out, "    -h, --help")?;
        writeln!(out, "        print this help message.")?;
        writeln!(out, "    -v, --version")?;
        writeln!(out, "        print the version of mbuild in use.")?;
        writeln!(out, "targets:")?;
        for target in &self.targets {
            writeln!(out, "    {}", target.name)?;
            writeln!(out, "        {}", target.description)?;
        }
        Ok(())
    }
}

/// Collects targets before freezing them into a [`TargetRegistry`].
#[derive(Default)]
pub struct TargetRegistryBuilder {
    targets: GrowableBuffer<Target>,
}

impl TargetRegistryBuilder {
    /// Registers a new target.
    pub fn target(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        invoker: impl Invoke + 'static,
    ) -> Self {
        self.with(Target::new(name, description, invoker))
    }

    /// Registers an already constructed target.
    pub fn with(mut self, target: Target) -> Self {
        self.targets.append(target);
        self
    }

    /// Registers several targets at once.
    pub fn with_all(mut self, targets: &[Target]) -> Self {
        self.targets.append_many(targets);
        self
    }

    /// Freezes the registry, rejecting empty or duplicate names.
    pub fn build(self) -> Result<TargetRegistry, RegistryError> {
        for (index, target) in self.targets.iter().enumerate() {
            if target.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }

            if self.targets[..index].iter().any(|seen| seen.name == target.name) {
                warn!("target `{}` registered twice", target.name);
                return Err(RegistryError::DuplicateTarget(target.name.clone()));
            }
        }

        Ok(TargetRegistry {
            targets: self.targets,
        })
    }
}
