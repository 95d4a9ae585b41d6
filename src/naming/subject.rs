//! The composed naming subject: one template, one allocator, one published
//! "next capture path".

use crate::error::ImcapResult;
use crate::events::{CoreEvent, EventBus};
use crate::naming::allocator::{UniqueCandidatePath, UniquePathAllocator};
use crate::naming::template::PathTemplate;

/// Owns the current [`PathTemplate`] and the allocator, and publishes the
/// allocator's result as the path the next capture will write to.
///
/// There is no process-wide mutable "current path": any component that
/// needs the current value receives it via the `PathChanged` notification
/// or an explicit [`NamingSubject::current`] query, never via ambient
/// global state. All mutation happens through `&mut self` on the
/// interactive context; last-writer-wins.
#[derive(Debug)]
pub struct NamingSubject {
    template: PathTemplate,
    allocator: UniquePathAllocator,
    current: UniqueCandidatePath,
    default_base: String,
    bus: EventBus,
}

impl NamingSubject {
    /// Build the subject from startup template values and publish the first
    /// allocation.
    pub fn new(template: PathTemplate, bus: EventBus) -> ImcapResult<Self> {
        let mut allocator = UniquePathAllocator::new();
        let current = allocator.allocate(&template.render())?;
        let default_base = template.base_name().to_string();
        bus.publish(CoreEvent::PathChanged(current.path.clone()));
        Ok(Self {
            template,
            allocator,
            current,
            default_base,
            bus,
        })
    }

    /// The path the next capture will be written to.
    pub fn current(&self) -> &UniqueCandidatePath {
        &self.current
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Select a sample: replace the base filename and recompute the unique
    /// path. The template is untouched when validation fails.
    pub fn select_subject(&mut self, base_name: &str) -> ImcapResult<&UniqueCandidatePath> {
        self.template.set_subject(base_name)?;
        self.refresh_from_template()
    }

    /// Replace the file extension and recompute the unique path.
    pub fn set_extension(&mut self, extension: &str) -> ImcapResult<&UniqueCandidatePath> {
        self.template.set_extension(extension)?;
        self.refresh_from_template()
    }

    /// Drop the sample selection and fall back to the startup base name.
    pub fn reset_subject(&mut self) -> ImcapResult<&UniqueCandidatePath> {
        let base = self.default_base.clone();
        self.select_subject(&base)
    }

    /// Recompute the unique path after a capture consumed the current one.
    ///
    /// Feeds the previously published path back into the allocator so the
    /// trailing `(n)` marker advances instead of restarting from the
    /// canonical name.
    pub fn reallocate(&mut self) -> ImcapResult<&UniqueCandidatePath> {
        let published = self.current.path.clone();
        let next = self.allocator.allocate(&published)?;
        self.publish(next);
        Ok(&self.current)
    }

    fn refresh_from_template(&mut self) -> ImcapResult<&UniqueCandidatePath> {
        let next = self.allocator.allocate(&self.template.render())?;
        self.publish(next);
        Ok(&self.current)
    }

    fn publish(&mut self, next: UniqueCandidatePath) {
        if next.path != self.current.path {
            tracing::info!(path = %next.path.display(), "next capture path changed");
        }
        self.bus.publish(CoreEvent::PathChanged(next.path.clone()));
        self.current = next;
    }
}
