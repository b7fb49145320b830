//! Shared state and nodes for the state_graph integration tests.

use async_trait::async_trait;
use manual_agent::{AgentError, Next, Node};

/// Records the ids of the nodes that ran, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CounterState {
    pub visited: Vec<String>,
    pub count: u32,
}

/// Appends its id to `visited` and increments `count`.
pub struct AppendNode {
    id: String,
}

impl AppendNode {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl Node<CounterState> for AppendNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, mut state: CounterState) -> Result<(CounterState, Next), AgentError> {
        state.visited.push(self.id.clone());
        state.count += 1;
        Ok((state, Next::Continue))
    }
}
