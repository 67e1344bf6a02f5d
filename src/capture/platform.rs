//! Host platform capabilities.
//!
//! The controller never inspects the host itself; the embedding
//! environment hands it a [`PlatformCapabilities`] value. Deriving one
//! from a client identity string is offered as a best-effort helper only.

use serde::{Deserialize, Serialize};

/// Broad device family, used to pick permission recovery steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    /// iPhone and iPad.
    Ios,
    /// Android phones and tablets.
    Android,
    /// Everything else.
    #[default]
    Desktop,
}

impl PlatformFamily {
    /// Steps for re-enabling camera access after a denial.
    pub fn recovery_instructions(self) -> &'static str {
        match self {
            PlatformFamily::Ios => {
                "On iOS:\n1. Open Settings\n2. Scroll down to Safari\n3. Tap Camera\n4. Select 'Allow'"
            }
            PlatformFamily::Android => {
                "On Android:\n1. Open Settings\n2. Tap Privacy\n3. Tap Permission manager\n4. Tap Camera\n5. Find this website and allow camera access"
            }
            PlatformFamily::Desktop => "Please enable camera access in your device settings.",
        }
    }

    /// Phones and tablets.
    #[inline]
    pub fn is_handheld(self) -> bool {
        matches!(self, PlatformFamily::Ios | PlatformFamily::Android)
    }
}

/// What the host platform can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    /// Host family, used for recovery instructions.
    pub family: PlatformFamily,
    /// Whether front/back switching is offered.
    pub supports_facing_switch: bool,
}

impl PlatformCapabilities {
    /// A desktop host with a single fixed camera.
    pub fn desktop() -> Self {
        Self::default()
    }

    /// A handheld host with front and rear cameras.
    pub fn handheld(family: PlatformFamily) -> Self {
        Self {
            family,
            supports_facing_switch: true,
        }
    }

    /// Infers capabilities from a client identity string.
    ///
    /// Plain substring matching; unknown strings are treated as desktop.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let family = if ["iphone", "ipad", "ipod"].iter().any(|m| ua.contains(m)) {
            PlatformFamily::Ios
        } else if ua.contains("android") {
            PlatformFamily::Android
        } else {
            PlatformFamily::Desktop
        };

        Self {
            family,
            supports_facing_switch: family.is_handheld(),
        }
    }
}

/// Recovery dialog contents shown after a permission denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPrompt {
    /// Platform the instructions are written for.
    pub family: PlatformFamily,
    /// Steps for re-enabling camera access.
    pub instructions: &'static str,
}

impl PermissionPrompt {
    /// Dialog title.
    pub const TITLE: &'static str = "Camera Permission Required";

    /// Prompt with the instructions for `family`.
    pub fn for_family(family: PlatformFamily) -> Self {
        Self {
            family,
            instructions: family.recovery_instructions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_ios() {
        let caps = PlatformCapabilities::from_user_agent(
            "Mozilla/5.0 (iPad; CPU OS 16_5 like Mac OS X) AppleWebKit/605.1.15",
        );
        assert_eq!(caps.family, PlatformFamily::Ios);
        assert!(caps.supports_facing_switch);
    }

    #[test]
    fn test_detects_android() {
        let caps =
            PlatformCapabilities::from_user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8)");
        assert_eq!(caps.family, PlatformFamily::Android);
    }

    #[test]
    fn test_unknown_is_desktop() {
        let caps = PlatformCapabilities::from_user_agent("Mozilla/5.0 (X11; Linux x86_64)");
        assert_eq!(caps, PlatformCapabilities::desktop());
        assert!(!caps.supports_facing_switch);
    }

    #[test]
    fn test_prompt_uses_family_steps() {
        let prompt = PermissionPrompt::for_family(PlatformFamily::Android);
        assert!(prompt.instructions.contains("Permission manager"));
        assert!(PermissionPrompt::for_family(PlatformFamily::Ios)
            .instructions
            .contains("Safari"));
    }
}
