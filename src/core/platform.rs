//! Target platform classification.
//!
//! Every compilation target gets one [`Platform`] tag when it is discovered.
//! The composite categories a target belongs to are precomputed from that
//! tag into a [`CategorySet`], so source-set mapping never re-derives them
//! from the target name.

use std::fmt;

use serde::{Serialize, Serializer};

/// Platform family of a compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Jvm,
    Js,
    Android,
    Ios,
    Tvos,
    Watchos,
    Macos,
    Linux,
    Mingw,
    Other,
}

impl Platform {
    /// Classify a target identifier such as `jvm`, `iosX64` or `linuxArm64`.
    pub fn from_target_name(name: &str) -> Self {
        match name {
            "jvm" => return Platform::Jvm,
            "js" => return Platform::Js,
            "android" => return Platform::Android,
            _ => {}
        }

        const PREFIXES: [(&str, Platform); 6] = [
            ("ios", Platform::Ios),
            ("tvos", Platform::Tvos),
            ("watchos", Platform::Watchos),
            ("macos", Platform::Macos),
            ("linux", Platform::Linux),
            ("mingw", Platform::Mingw),
        ];

        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|&(_, platform)| platform)
            .unwrap_or(Platform::Other)
    }

    pub fn is_jvm(self) -> bool {
        self == Platform::Jvm
    }

    /// Composite categories this platform belongs to.
    pub fn categories(self) -> CategorySet {
        use Platform::*;

        let ios = self == Ios;
        let tvos = self == Tvos;
        let watchos = self == Watchos;
        let macos = self == Macos;
        let linux = self == Linux;
        let mingw = self == Mingw;

        let native_desktop = mingw || linux || macos;
        let native_mobile = ios || tvos || watchos;
        let apple = ios || tvos || watchos || macos;
        let posix = apple || linux;

        let mut set = CategorySet::empty();
        set.set(Category::Native, native_desktop || native_mobile);
        set.set(Category::NativeDesktop, native_desktop);
        set.set(Category::NativeMobile, native_mobile);
        set.set(Category::Apple, apple);
        set.set(Category::Posix, posix);
        set.set(Category::PosixNonApple, posix && !apple);
        set.set(Category::PosixApple, posix && apple);
        set.set(Category::IosWatchosTvosCommon, ios || tvos || watchos);
        set.set(Category::IosWatchosCommon, ios || watchos);
        set.set(Category::IosTvosCommon, ios || tvos);
        set.set(Category::MacosIosTvosCommon, macos || ios || tvos);
        set.set(Category::MacosIosWatchosCommon, macos || ios || watchos);
        set.set(Category::IosCommon, ios);
        set
    }
}

/// A derived platform category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Native,
    NativeDesktop,
    NativeMobile,
    Apple,
    Posix,
    PosixNonApple,
    PosixApple,
    IosWatchosTvosCommon,
    IosWatchosCommon,
    IosTvosCommon,
    MacosIosTvosCommon,
    MacosIosWatchosCommon,
    IosCommon,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Native,
        Category::NativeDesktop,
        Category::NativeMobile,
        Category::Apple,
        Category::Posix,
        Category::PosixNonApple,
        Category::PosixApple,
        Category::IosWatchosTvosCommon,
        Category::IosWatchosCommon,
        Category::IosTvosCommon,
        Category::MacosIosTvosCommon,
        Category::MacosIosWatchosCommon,
        Category::IosCommon,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Native => "native",
            Category::NativeDesktop => "nativeDesktop",
            Category::NativeMobile => "nativeMobile",
            Category::Apple => "apple",
            Category::Posix => "posix",
            Category::PosixNonApple => "posixNonApple",
            Category::PosixApple => "posixApple",
            Category::IosWatchosTvosCommon => "iosWatchosTvosCommon",
            Category::IosWatchosCommon => "iosWatchosCommon",
            Category::IosTvosCommon => "iosTvosCommon",
            Category::MacosIosTvosCommon => "macosIosTvosCommon",
            Category::MacosIosWatchosCommon => "macosIosWatchosCommon",
            Category::IosCommon => "iosCommon",
        }
    }

    /// Bundle folder prefix for this category, before the `Main`/`Test` suffix.
    ///
    /// `nativeMobile` and `apple` only feed the composites and have no folder.
    pub fn folder(self) -> Option<&'static str> {
        match self {
            Category::Native => Some("nativeCommon"),
            Category::NativeDesktop => Some("nativeDesktop"),
            Category::NativeMobile | Category::Apple => None,
            Category::Posix => Some("nativePosix"),
            Category::PosixNonApple => Some("nativePosixNonApple"),
            Category::PosixApple => Some("nativePosixApple"),
            other => Some(other.name()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of categories stored as flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CategorySet(u16);

impl CategorySet {
    pub const fn empty() -> Self {
        CategorySet(0)
    }

    pub fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn insert(&mut self, category: Category) {
        self.0 |= category.bit();
    }

    fn set(&mut self, category: Category, on: bool) {
        if on {
            self.insert(category);
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Category::name)).finish()
    }
}

impl Serialize for CategorySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter().map(Category::name))
    }
}

/// Platform tag plus its precomputed categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetClassification {
    pub platform: Platform,
    pub categories: CategorySet,
}

impl TargetClassification {
    pub fn for_target(name: &str) -> Self {
        let platform = Platform::from_target_name(name);
        TargetClassification {
            platform,
            categories: platform.categories(),
        }
    }

    pub fn is(&self, category: Category) -> bool {
        self.categories.contains(category)
    }
}
