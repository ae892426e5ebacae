use std::collections::HashMap;
use std::sync::Arc;

use crate::step::{ConcernStep, ConfirmedStep, ContactStep, ServiceAndTimeStep, Step, WizardStep};

/// Edge between steps in the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    from: Step,
    to: Step,
}

/// The steps of a booking and how they connect
pub struct BookingFlow {
    steps: HashMap<Step, Arc<dyn WizardStep>>,
    edges: Vec<Edge>,
    start_step: Step,
}

impl Default for BookingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingFlow {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            edges: Vec::new(),
            start_step: Step::ServiceAndTime,
        }
    }

    /// The four-step booking: service and time, contact, concern, confirmation.
    pub fn standard() -> Self {
        FlowBuilder::new()
            .add_step(Arc::new(ServiceAndTimeStep))
            .add_step(Arc::new(ContactStep))
            .add_step(Arc::new(ConcernStep))
            .add_step(Arc::new(ConfirmedStep))
            .add_edge(Step::ServiceAndTime, Step::Contact)
            .add_edge(Step::Contact, Step::Concern)
            .add_edge(Step::Concern, Step::Confirmed)
            .build()
    }

    /// Add a step to the flow. The first step added becomes the start step.
    pub fn add_step(&mut self, step: Arc<dyn WizardStep>) -> &mut Self {
        if self.steps.is_empty() {
            self.start_step = step.id();
        }
        self.steps.insert(step.id(), step);
        self
    }

    pub fn add_edge(&mut self, from: Step, to: Step) -> &mut Self {
        self.edges.push(Edge { from, to });
        self
    }

    pub fn start_step(&self) -> Step {
        self.start_step
    }

    pub fn get_step(&self, id: Step) -> Option<Arc<dyn WizardStep>> {
        self.steps.get(&id).cloned()
    }

    /// Step reached by moving forward from `current`
    pub fn next_step(&self, current: Step) -> Option<Step> {
        self.edges
            .iter()
            .find(|edge| edge.from == current)
            .map(|edge| edge.to)
    }

    /// Step reached by going back from `current`. Terminal steps have none.
    pub fn previous_step(&self, current: Step) -> Option<Step> {
        if current.is_terminal() {
            return None;
        }
        self.edges
            .iter()
            .find(|edge| edge.to == current)
            .map(|edge| edge.from)
    }
}

/// Builder for creating flows
#[derive(Default)]
pub struct FlowBuilder {
    flow: BookingFlow,
}

impl FlowBuilder {
    pub fn new() -> Self {
        Self {
            flow: BookingFlow::new(),
        }
    }

    pub fn add_step(mut self, step: Arc<dyn WizardStep>) -> Self {
        self.flow.add_step(step);
        self
    }

    pub fn add_edge(mut self, from: Step, to: Step) -> Self {
        self.flow.add_edge(from, to);
        self
    }

    pub fn build(self) -> BookingFlow {
        self.flow
    }
}
