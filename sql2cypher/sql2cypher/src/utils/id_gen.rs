use std::collections::HashMap;
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct IdGenerator<T: From<usize>> {
    next_id: usize,
    phantom: PhantomData<T>,
}

impl<T: From<usize>> IdGenerator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as taken, so that it is never generated.
    pub fn skip(&mut self, id: usize) {
        self.next_id = self.next_id.max(id + 1);
    }

    pub fn gen(&mut self) -> T {
        let id = self.next_id;
        self.next_id += 1;
        T::from(id)
    }
}

impl<T: From<usize>> Default for IdGenerator<T> {
    fn default() -> IdGenerator<T> {
        IdGenerator {
            next_id: 0,
            phantom: PhantomData,
        }
    }
}

/// Names the Cypher parameters of a single translation.
///
/// Anonymous placeholders are numbered from 1, in the order they are
/// requested. Explicitly numbered placeholders reserve their number, so a
/// later anonymous one never collides with them.
#[derive(Debug, Clone)]
pub struct ParameterNameGenerator {
    index: IdGenerator<usize>,
}

impl Default for ParameterNameGenerator {
    fn default() -> Self {
        let mut index = IdGenerator::new();
        index.skip(0);
        ParameterNameGenerator { index }
    }
}

impl ParameterNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the next `?`.
    pub fn new_index(&mut self) -> String {
        self.index.gen().to_string()
    }

    /// Name for `$n`.
    pub fn indexed(&mut self, n: usize) -> String {
        self.index.skip(n);
        n.to_string()
    }

    /// Name for `:name`.
    pub fn named(&mut self, name: &str) -> String {
        name.to_string()
    }
}

/// Hands out a name once as is, then with an increasing suffix: `name`,
/// `name1`, `name2`...
#[derive(Debug, Clone, Default)]
pub struct UniqueNameGenerator {
    seen: HashMap<String, IdGenerator<usize>>,
}

impl UniqueNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gen(&mut self, name: &str) -> String {
        match self.seen.entry(name.to_string()).or_default().gen() {
            0 => name.to_string(),
            n => format!("{name}{n}"),
        }
    }
}
