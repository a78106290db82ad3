//! Parse table abstraction.

/// The trait for abstracting the parse tables driven by the runtime engine.
pub trait ParseTable {
    /// The number to identify the state of the LR automaton.
    type State: Copy;

    /// The number to identify the terminal/nonterminal symbols.
    type Symbol: Copy;

    /// The value describing the matched production rule on reduction.
    type Reduce;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    ///
    /// If there is no lookahead symbol, a `None` is passed as the end of input.
    /// Passing a nonterminal symbol queries the GOTO part of the table, whose
    /// successful result is reported as a `Shift` to the target state.
    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        (**self).action(current, lookahead)
    }
}

impl<T: ?Sized> ParseTable for std::rc::Rc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        (**self).action(current, lookahead)
    }
}

impl<T: ?Sized> ParseTable for std::sync::Arc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        (**self).action(current, lookahead)
    }
}

#[derive(Debug, Copy, Clone)]
#[non_exhaustive]
pub enum ParseAction<TState, TSymbol, TReduce> {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Reduce to the specified production rule; the left-hand symbol and the
    /// number of states to pop are attached for the engine.
    Reduce(TReduce, TSymbol, usize),

    Accept,

    Error(ParseActionError),
}

#[derive(Debug, Copy, Clone, thiserror::Error)]
pub enum ParseActionError {
    #[error("incorrect state index")]
    IncorrectState,

    #[error("no action defined for the lookahead symbol")]
    NoAction,
}
