//! Styling prompts for image enhancement
//!
//! Each category carries a small table of prompts; variant `i` of a product
//! uses the prompt for slot `i`, wrapping when more variants are requested
//! than prompts exist. Unknown categories fall back to the default table.

const DEFAULT_PROMPTS: &[&str] = &[
    "Place this product on a clean white studio background with soft, even lighting \
     and a subtle shadow beneath it.",
    "Show this product in a tasteful lifestyle setting that matches its purpose, \
     keeping the product sharp and centered.",
    "Create a premium catalog shot of this product on a neutral gradient background \
     with gentle reflections.",
];

const ELECTRONICS_PROMPTS: &[&str] = &[
    "Photograph this device on a matte dark surface with dramatic rim lighting, \
     emphasizing its silhouette and finish.",
    "Place this device on a minimalist desk setup with soft daylight from a window, \
     keeping the device in crisp focus.",
    "Render a clean studio shot of this device on a white background with a faint \
     reflection below it.",
];

const CLOTHING_PROMPTS: &[&str] = &[
    "Present this garment neatly laid flat on a light linen surface, photographed \
     from directly above in soft natural light.",
    "Show this garment on an invisible mannequin against a plain light-grey \
     background, with fabric texture clearly visible.",
    "Style this garment in a bright editorial setting with complementary neutral \
     tones around it.",
];

const JEWELLERY_PROMPTS: &[&str] = &[
    "Photograph this piece on black velvet with a single focused spotlight bringing \
     out sparkle and detail.",
    "Place this piece on a white marble surface with soft diffuse light and a \
     shallow depth of field.",
    "Show this piece worn in a close-up shot with a softly blurred warm background.",
];

fn prompts_for_category(category: &str) -> &'static [&'static str] {
    match category.to_ascii_lowercase().as_str() {
        "electronics" => ELECTRONICS_PROMPTS,
        "clothing" | "apparel" => CLOTHING_PROMPTS,
        "jewellery" | "jewelry" | "necklace" | "ring" | "earring" => JEWELLERY_PROMPTS,
        _ => DEFAULT_PROMPTS,
    }
}

/// Prompt for variant `variant_index` (zero-based) of a product in `category`
pub fn prompt_for(category: &str, variant_index: u32) -> &'static str {
    let prompts = prompts_for_category(category);
    prompts[variant_index as usize % prompts.len()]
}
