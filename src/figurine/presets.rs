//! Preset instruction prompts sent alongside the image.

/// A named instruction string for the generation model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetPrompt {
    /// Label shown to users, e.g. `手办化2`
    pub label: &'static str,
    /// Instruction text sent to the model
    pub text: &'static str,
}

/// Closed set of presets a trigger phrase can select
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Preset {
    /// 1/7 PVC statue with packaging box and `ZBrush` monitor
    #[default]
    Figurine1,
    /// Bandai-style commercial figure on a computer desk
    Figurine2,
    /// Likeness-focused figurine in commercial packaging
    Figurine3,
    /// Realistic PVC figure from a game screenshot
    Figurine4,
    /// Chibi / super-deformed restyle
    Chibi,
}

const FIGURINE_1: &str = "Please accurately transform the main subject in this photo into a realistic, masterpiece-like 1/7 scale PVC statue. Behind this statue, a packaging box should be placed: the box has a large clear front window on its front side, and is printed with subject artwork, product name, brand logo, barcode, as well as a small specifications or authenticity verification panel. A small price tag sticker must also be attached to one corner of the box. Meanwhile, a computer monitor is placed at the back, and the monitor screen needs to display the ZBrush modeling process of this statue. In front of the packaging box, this statue should be placed on a round plastic base. The statue must have 3D dimensionality and a sense of realism, and the texture of the PVC material needs to be clearly represented. If the background can be set as an indoor scene, the effect will be even better. Below are detailed guidelines to note: When repairing any missing parts, there must be no poorly executed elements. When repairing human figures (if applicable), the body parts must be natural, movements must be coordinated, and the proportions of all parts must be reasonable. If the original photo is not a full-body shot, try to supplement the statue to make it a full-body version. The human figure’s expression and movements must be exactly consistent with those in the photo. The figure’s head should not appear too large, its legs should not appear too short, and the figure should not look stunted—this guideline may be ignored if the statue is a chibi-style design. For animal statues, the realism and level of detail of the fur should be reduced to make it more like a statue rather than the real original creature. No outer outline lines should be present, and the statue must not be flat. Please pay attention to the perspective relationship of near objects appearing larger and far objects smaller.";

const FIGURINE_2: &str = "Use the nano-banana model to create a 1/7 scale commercialized figure of the character in the illustration, in a realistic style and environment. Place the figure on a computer desk, using a circular transparent acrylic base without any text. On the computer screen, display the ZBrush modeling process of the figure. Next to the computer screen, place a BANDAI-style toy packaging box printed with the original artwork.";

const FIGURINE_3: &str = "Your primary mission is to accurately convert the subject from the user's photo into a photorealistic, masterpiece quality, 1/7 scale PVC figurine, presented in its commercial packaging. Crucial First Step: Analyze the image to identify the subject's key attributes (e.g., human male, human female, animal, specific creature) and defining features (hair style, clothing, expression). The generated figurine must strictly adhere to these identified attributes. Top Priority - Character Likeness: The figurine's face MUST maintain a strong likeness to the original character. Your task is to translate the 2D facial features into a 3D sculpt, preserving the identity, expression, and core characteristics. If the source is blurry, interpret the features to create a sharp, well-defined version that is clearly recognizable as the same character. Scene Details: Figurine: The figure version of the photo I gave you, with a clear representation of PVC material, placed on a round plastic base. Packaging: Behind the figure, there should be a partially transparent plastic and paper box, with the character from the photo printed on it. Environment: The entire scene should be in an indoor setting with good lighting.";

const FIGURINE_4: &str = "Realistic PVC figure based on the game screenshot character, exact pose replication highly detailed textures PVC material with subtle sheen and smooth paint finish, placed on an indoor wooden computer desk (with subtle desk items like a figure box/mouse), illuminated by soft indoor light (mix of desk lamp and natural window light) for realistic shadows and highlights, macro photography style, high resolution, sharp focus on the figure, shallow depth of field (desk background slightly blurred but visible), no stylization, true-to-reference color and design, 1:1 scale.";

const CHIBI: &str = "((chibi style)), ((super-deformed)), ((head-to-body ratio 1:2)), ((huge head, tiny body)), ((smooth rounded limbs)), ((soft balloon-like hands and feet)), ((plump cheeks)), ((childlike big eyes)), ((simplified facial features)), ((smooth matte skin, no pores)), ((soft pastel color palette)), ((gentle ambient lighting, natural shadows)), ((same facial expression, same pose, same background scene)), ((seamless integration with original environment, correct perspective and scale)), ((no outline or thin soft outline)), ((high resolution, sharp focus, 8k, ultra-detailed)), avoid: realistic proportions, long limbs, sharp edges, harsh lighting, wrinkles, blemishes, thick black outlines, low resolution, blurry, extra limbs, distorted face";

/// Every preset in display order
pub const PRESETS: &[Preset] = &[
    Preset::Figurine1,
    Preset::Figurine2,
    Preset::Figurine3,
    Preset::Figurine4,
    Preset::Chibi,
];

impl Preset {
    /// Label and instruction text of this preset
    #[must_use]
    pub const fn prompt(self) -> PresetPrompt {
        let (label, text) = match self {
            Self::Figurine1 => ("手办化1", FIGURINE_1),
            Self::Figurine2 => ("手办化2", FIGURINE_2),
            Self::Figurine3 => ("手办化3", FIGURINE_3),
            Self::Figurine4 => ("手办化4", FIGURINE_4),
            Self::Chibi => ("Q版化", CHIBI),
        };
        PresetPrompt { label, text }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.prompt().label
    }

}
