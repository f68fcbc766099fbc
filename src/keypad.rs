//! Cost propagation through chains of remotely-operated keypads
//!
//! Pressing a key on a pad is driven by a move sequence entered on a controlling directional pad,
//! which is itself driven by another, and so on for a configurable depth. Every pad cursor starts
//! on and returns through its `A` key, so the cost of a sequence decomposes per key transition,
//! which keeps the memoized recursion small even at large depths.
//!
//! For each ordered key pair a single canonical move sequence is used: one horizontal run and one
//! vertical run, horizontal first when moving left, flipped when the preferred corner crosses the
//! pad's blocked cell. This ordering is cost-minimal under any further chaining.

use {
    crate::*,
    glam::IVec2,
    nom::{
        character::complete::line_ending,
        combinator::{map, map_res},
        error::Error as NomError,
        multi::{many1, separated_list1},
        Err, IResult,
    },
    std::collections::HashMap,
};

define_cell! {
    #[repr(u8)]
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
    pub enum Key {
        #[default]
        Activate = ACTIVATE = b'A',
        Zero = ZERO = b'0',
        One = ONE = b'1',
        Two = TWO = b'2',
        Three = THREE = b'3',
        Four = FOUR = b'4',
        Five = FIVE = b'5',
        Six = SIX = b'6',
        Seven = SEVEN = b'7',
        Eight = EIGHT = b'8',
        Nine = NINE = b'9',
        Up = UP = b'^',
        Down = DOWN = b'v',
        Left = LEFT = b'<',
        Right = RIGHT = b'>',
        Gap = GAP = b'#',
    }
}

impl Key {
    pub fn try_digit(self) -> Option<u64> {
        let byte: u8 = self as u8;

        byte.is_ascii_digit().then(|| (byte - Self::ZERO) as u64)
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum PadBuildError {
    NoHomeKey,
    NoBlockedCell,
    MultipleBlockedCells,
    DuplicateKey(Key),
    UnroutableKeyPair { from: Key, to: Key },
    MissingControlKey(Key),
}

/// A key not present on the pad a sequence was to be entered on
#[derive(Debug, Eq, PartialEq)]
pub struct UnknownKey(pub Key);

/// A keypad layout with its canonical move sequence precomputed for every ordered key pair
pub struct Pad {
    key_pos: HashMap<Key, IVec2>,
    sequences: HashMap<(Key, Key), Vec<Key>>,
}

impl Pad {
    const NUMERIC_STR: &'static str = "789\n456\n123\n#0A";
    const DIRECTIONAL_STR: &'static str = "#^A\n<v>";

    pub fn numeric() -> Self {
        // The built-in layout is statically known to be valid
        Self::try_from(Self::NUMERIC_STR).unwrap()
    }

    pub fn directional() -> Self {
        // The built-in layout is statically known to be valid
        Self::try_from(Self::DIRECTIONAL_STR).unwrap()
    }

    pub fn try_from_grid(grid: Grid2D<Key>) -> Result<Self, PadBuildError> {
        use PadBuildError::*;

        let mut key_pos: HashMap<Key, IVec2> = HashMap::new();
        let mut gap: Option<IVec2> = None;

        for (index, key) in grid.cells().iter().copied().enumerate() {
            let pos: IVec2 = grid.pos_from_index(index);

            if key == Key::Gap {
                if gap.replace(pos).is_some() {
                    return Err(MultipleBlockedCells);
                }
            } else if key_pos.insert(key, pos).is_some() {
                return Err(DuplicateKey(key));
            }
        }

        let gap: IVec2 = gap.ok_or(NoBlockedCell)?;

        if !key_pos.contains_key(&Key::Activate) {
            return Err(NoHomeKey);
        }

        let mut sequences: HashMap<(Key, Key), Vec<Key>> = HashMap::new();

        for (&from, &from_pos) in &key_pos {
            for (&to, &to_pos) in &key_pos {
                sequences.insert(
                    (from, to),
                    Self::canonical_moves(from_pos, to_pos, gap)
                        .ok_or(UnroutableKeyPair { from, to })?,
                );
            }
        }

        Ok(Self { key_pos, sequences })
    }

    #[inline]
    pub fn contains(&self, key: Key) -> bool {
        self.key_pos.contains_key(&key)
    }

    pub fn canonical_sequence(&self, from: Key, to: Key) -> Option<&[Key]> {
        self.sequences.get(&(from, to)).map(Vec::as_slice)
    }

    fn pair_sequence(&self, from: Key, to: Key) -> &[Key] {
        // All ordered pairs over the pad's keys are precomputed at construction
        &self.sequences[&(from, to)]
    }

    fn canonical_moves(from: IVec2, to: IVec2, gap: IVec2) -> Option<Vec<Key>> {
        let delta: IVec2 = to - from;
        let horizontal_key: Key = if delta.x < 0_i32 { Key::Left } else { Key::Right };
        let vertical_key: Key = if delta.y < 0_i32 { Key::Up } else { Key::Down };
        let horizontal_run: usize = delta.x.unsigned_abs() as usize;
        let vertical_run: usize = delta.y.unsigned_abs() as usize;

        let moves_through = |corner: IVec2, corner_first_key: Key| -> Option<Vec<Key>> {
            (!Self::on_segment(gap, from, corner) && !Self::on_segment(gap, corner, to)).then(
                || {
                    let mut moves: Vec<Key> = Vec::with_capacity(horizontal_run + vertical_run);
                    let (first_key, first_run, second_key, second_run) =
                        if corner_first_key == horizontal_key {
                            (horizontal_key, horizontal_run, vertical_key, vertical_run)
                        } else {
                            (vertical_key, vertical_run, horizontal_key, horizontal_run)
                        };

                    moves.extend(std::iter::repeat(first_key).take(first_run));
                    moves.extend(std::iter::repeat(second_key).take(second_run));
                    moves
                },
            )
        };

        let horizontal_corner: IVec2 = IVec2::new(to.x, from.y);
        let vertical_corner: IVec2 = IVec2::new(from.x, to.y);

        // Moving left wants the horizontal run first; otherwise the vertical run comes first. The
        // blocked cell flips the order when the preferred corner would cross it.
        if delta.x < 0_i32 {
            moves_through(horizontal_corner, horizontal_key)
                .or_else(|| moves_through(vertical_corner, vertical_key))
        } else {
            moves_through(vertical_corner, vertical_key)
                .or_else(|| moves_through(horizontal_corner, horizontal_key))
        }
    }

    fn on_segment(p: IVec2, a: IVec2, b: IVec2) -> bool {
        let min: IVec2 = a.min(b);
        let max: IVec2 = a.max(b);

        (p.cmpge(min) & p.cmple(max)).all() && (p.x == a.x && p.x == b.x || p.y == a.y && p.y == b.y)
    }
}

impl Parse for Pad {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map_res(Grid2D::parse, Self::try_from_grid)(input)
    }
}

impl<'i> TryFrom<&'i str> for Pad {
    type Error = Err<NomError<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}

/// A base pad driven through `depth` layers of a directional control pad
pub struct KeypadChain {
    base: Pad,
    control: Pad,
    cache: HashMap<(usize, Vec<Key>), u64>,
}

impl KeypadChain {
    const CONTROL_KEYS: [Key; 5_usize] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Activate];

    pub fn new(base: Pad, control: Pad) -> Result<Self, PadBuildError> {
        for key in Self::CONTROL_KEYS {
            if !control.contains(key) {
                return Err(PadBuildError::MissingControlKey(key));
            }
        }

        Ok(Self {
            base,
            control,
            cache: HashMap::new(),
        })
    }

    /// The numeric pad driven through directional pads
    pub fn standard() -> Self {
        // Both built-in layouts are statically known to be valid
        Self::new(Pad::numeric(), Pad::directional()).unwrap()
    }

    /// Computes the minimum number of presses on the topmost pad that enters `sequence` on the
    /// base pad, with `depth` control pads in between.
    ///
    /// At depth zero the topmost pad is the base pad itself, so each transition costs its move run
    /// plus the confirming press.
    pub fn min_presses(&mut self, sequence: &[Key], depth: usize) -> Result<u64, UnknownKey> {
        let mut presses: u64 = 0_u64;
        let mut from: Key = Key::Activate;

        for &to in sequence {
            let moves: &[Key] = self
                .base
                .canonical_sequence(from, to)
                .ok_or(UnknownKey(to))?;

            presses += if depth == 0_usize {
                moves.len() as u64 + 1_u64
            } else {
                let mut controlled: Vec<Key> = moves.to_vec();

                controlled.push(Key::Activate);

                Self::sequence_cost(&self.control, &mut self.cache, &controlled, depth - 1_usize)
            };
            from = to;
        }

        Ok(presses)
    }

    /// The number of presses that enters `sequence` on the control pad, with `depth` further
    /// control pads above it
    fn sequence_cost(
        control: &Pad,
        cache: &mut HashMap<(usize, Vec<Key>), u64>,
        sequence: &[Key],
        depth: usize,
    ) -> u64 {
        let cache_key: (usize, Vec<Key>) = (depth, sequence.to_vec());

        if let Some(&cost) = cache.get(&cache_key) {
            return cost;
        }

        let mut cost: u64 = 0_u64;
        let mut from: Key = Key::Activate;

        for &to in sequence {
            let moves: &[Key] = control.pair_sequence(from, to);

            cost += if depth == 0_usize {
                moves.len() as u64 + 1_u64
            } else {
                let mut controlled: Vec<Key> = moves.to_vec();

                controlled.push(Key::Activate);

                Self::sequence_cost(control, cache, &controlled, depth - 1_usize)
            };
            from = to;
        }

        cache.insert(cache_key, cost);

        cost
    }
}

/// A key sequence to enter on the base pad, typically digits followed by `A`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Code(Vec<Key>);

impl Code {
    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// The integer formed by the digit keys of the code, ignoring all other keys
    pub fn numeric_part(&self) -> u64 {
        self.0
            .iter()
            .copied()
            .filter_map(Key::try_digit)
            .fold(0_u64, |numeric_part, digit| numeric_part * 10_u64 + digit)
    }

    /// The minimum press count at `depth` multiplied by the code's numeric part
    pub fn complexity(&self, chain: &mut KeypadChain, depth: usize) -> Result<u64, UnknownKey> {
        Ok(chain.min_presses(&self.0, depth)? * self.numeric_part())
    }
}

impl Parse for Code {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map(many1(Key::parse), Self)(input)
    }
}

impl<'i> TryFrom<&'i str> for Code {
    type Error = Err<NomError<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CodeList(Vec<Code>);

impl CodeList {
    #[inline]
    pub fn codes(&self) -> &[Code] {
        &self.0
    }

    pub fn complexity_sum(&self, chain: &mut KeypadChain, depth: usize) -> Result<u64, UnknownKey> {
        self.0
            .iter()
            .map(|code: &Code| code.complexity(chain, depth))
            .sum()
    }
}

impl Parse for CodeList {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        map(separated_list1(line_ending, Code::parse), Self)(input)
    }
}

impl<'i> TryFrom<&'i str> for CodeList {
    type Error = Err<NomError<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::sync::OnceLock};

    const CODE_LIST_STR: &str = "029A\n980A\n179A\n456A\n379A";

    fn code_list() -> &'static CodeList {
        static ONCE_LOCK: OnceLock<CodeList> = OnceLock::new();

        ONCE_LOCK.get_or_init(|| CodeList::try_from(CODE_LIST_STR).unwrap())
    }

    fn code(code_str: &str) -> Code {
        Code::try_from(code_str).unwrap()
    }

    #[test]
    fn test_canonical_sequences() {
        use Key::*;

        let numeric: Pad = Pad::numeric();
        let directional: Pad = Pad::directional();

        // The vertical run comes first when the bottom row's blocked cell would be crossed
        assert_eq!(
            numeric.canonical_sequence(Activate, Seven).unwrap(),
            &[Up, Up, Up, Left, Left]
        );
        assert_eq!(
            numeric.canonical_sequence(Seven, Activate).unwrap(),
            &[Right, Right, Down, Down, Down]
        );

        // Unblocked leftward moves keep the horizontal run first
        assert_eq!(
            numeric.canonical_sequence(Three, Seven).unwrap(),
            &[Left, Left, Up, Up]
        );

        assert_eq!(
            directional.canonical_sequence(Activate, Left).unwrap(),
            &[Down, Left, Left]
        );
        assert_eq!(directional.canonical_sequence(Up, Up).unwrap(), &[] as &[Key]);
    }

    #[test]
    fn test_min_presses_depth_zero() {
        let mut chain: KeypadChain = KeypadChain::standard();

        assert_eq!(chain.min_presses(code("0").keys(), 0_usize), Ok(2_u64));
        assert_eq!(chain.min_presses(code("029A").keys(), 0_usize), Ok(12_u64));
    }

    #[test]
    fn test_min_presses() {
        let mut chain: KeypadChain = KeypadChain::standard();

        assert_eq!(
            code_list()
                .codes()
                .iter()
                .map(|code: &Code| chain.min_presses(code.keys(), 2_usize))
                .collect::<Result<Vec<u64>, UnknownKey>>(),
            Ok(vec![68_u64, 60_u64, 68_u64, 64_u64, 64_u64])
        );
    }

    #[test]
    fn test_min_presses_depth_monotonicity() {
        let mut chain: KeypadChain = KeypadChain::standard();
        let code: Code = code("0");
        let mut prev_presses: u64 = 0_u64;

        for depth in 0_usize..5_usize {
            let presses: u64 = chain.min_presses(code.keys(), depth).unwrap();

            assert!(presses > prev_presses);
            prev_presses = presses;
        }
    }

    #[test]
    fn test_min_presses_additivity() {
        let mut chain: KeypadChain = KeypadChain::standard();

        assert_eq!(
            chain.min_presses(code("029A379A").keys(), 2_usize).unwrap(),
            chain.min_presses(code("029A").keys(), 2_usize).unwrap()
                + chain.min_presses(code("379A").keys(), 2_usize).unwrap()
        );
    }

    #[test]
    fn test_unknown_key() {
        let mut chain: KeypadChain = KeypadChain::standard();

        assert_eq!(
            chain.min_presses(code("0^A").keys(), 2_usize),
            Err(UnknownKey(Key::Up))
        );
    }

    #[test]
    fn test_cache_reuse() {
        let mut chain: KeypadChain = KeypadChain::standard();
        let presses: u64 = chain.min_presses(code("029A").keys(), 2_usize).unwrap();

        assert!(!chain.cache.is_empty());

        let cache_len: usize = chain.cache.len();

        // A repeated call is served entirely from the cache
        assert_eq!(
            chain.min_presses(code("029A").keys(), 2_usize),
            Ok(presses)
        );
        assert_eq!(chain.cache.len(), cache_len);
    }

    #[test]
    fn test_numeric_part() {
        assert_eq!(code("029A").numeric_part(), 29_u64);
        assert_eq!(code("980A").numeric_part(), 980_u64);
    }

    #[test]
    fn test_complexity_sum() {
        let mut chain: KeypadChain = KeypadChain::standard();

        assert_eq!(
            code_list().complexity_sum(&mut chain, 2_usize),
            Ok(126384_u64)
        );
        assert_eq!(
            code_list().complexity_sum(&mut chain, 25_usize),
            Ok(154115708116294_u64)
        );
    }

    #[test]
    fn test_pad_build_errors() {
        use PadBuildError::*;

        let try_pad = |pad_str: &str| -> Result<Pad, PadBuildError> {
            Pad::try_from_grid(Grid2D::parse(pad_str).unwrap().1)
        };

        assert_eq!(try_pad("0A").err(), Some(NoBlockedCell));
        assert_eq!(try_pad("#0\n#A").err(), Some(MultipleBlockedCells));
        assert_eq!(try_pad("#12").err(), Some(NoHomeKey));
        assert_eq!(try_pad("#A\n1A").err(), Some(DuplicateKey(Key::Activate)));
        assert!(matches!(
            try_pad("A#1").err(),
            Some(UnroutableKeyPair { .. })
        ));
        assert!(matches!(
            KeypadChain::new(Pad::numeric(), Pad::numeric()).err(),
            Some(PadBuildError::MissingControlKey(_))
        ));
    }
}
