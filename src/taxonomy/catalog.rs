//! Built-in catalog and keyword tables.

/// Categories with their subcategories; the first subcategory is the default.
pub(crate) const STANDARD_CATALOG: &[(&str, &[&str])] = &[
    (
        "Clothing",
        &[
            "Dresses",
            "Tops",
            "Bottoms",
            "Outerwear",
            "Activewear",
            "Sleepwear",
            "Underwear",
            "Swimwear",
            "Accessories",
            "Uniforms",
            "Costumes",
        ],
    ),
    (
        "Footwear",
        &[
            "Athletic Shoes",
            "Casual Shoes",
            "Dress Shoes",
            "Boots",
            "Sandals",
            "Heels",
            "Flats",
            "Slippers",
            "Specialty Footwear",
        ],
    ),
    (
        "Beauty",
        &[
            "Makeup",
            "Skincare",
            "Hair Care",
            "Fragrances",
            "Nail Care",
            "Bath & Body",
            "Tools & Accessories",
            "Men's Grooming",
        ],
    ),
    (
        "Electronics",
        &[
            "Mobile Phones",
            "Computers",
            "Audio & Video",
            "Gaming",
            "Cameras",
            "Wearables",
            "Smart Home",
            "Accessories",
            "Components",
        ],
    ),
    (
        "Home & Garden",
        &[
            "Furniture",
            "Decor",
            "Kitchen & Dining",
            "Bedding & Bath",
            "Storage",
            "Lighting",
            "Garden & Outdoor",
            "Cleaning Supplies",
            "Tools",
        ],
    ),
    (
        "Sports & Outdoors",
        &[
            "Exercise Equipment",
            "Outdoor Gear",
            "Sports Equipment",
            "Athletic Wear",
            "Water Sports",
            "Winter Sports",
            "Team Sports",
            "Fitness Accessories",
        ],
    ),
    (
        "Toys & Games",
        &[
            "Action Figures",
            "Dolls",
            "Board Games",
            "Educational Toys",
            "Electronic Toys",
            "Outdoor Toys",
            "Arts & Crafts",
            "Collectibles",
            "Baby Toys",
        ],
    ),
    (
        "Books & Media",
        &[
            "Books",
            "Movies & TV",
            "Music",
            "Video Games",
            "Magazines",
            "Educational Materials",
            "Digital Media",
        ],
    ),
    (
        "Automotive",
        &[
            "Parts & Accessories",
            "Tools & Equipment",
            "Car Care",
            "Electronics",
            "Interior Accessories",
            "Exterior Accessories",
            "Tires & Wheels",
        ],
    ),
    (
        "Health & Personal Care",
        &[
            "Vitamins & Supplements",
            "Medical Supplies",
            "Personal Care",
            "Oral Care",
            "Vision Care",
            "First Aid",
            "Mobility Aids",
        ],
    ),
    (
        "Jewelry & Watches",
        &[
            "Fine Jewelry",
            "Fashion Jewelry",
            "Watches",
            "Accessories",
            "Wedding & Engagement",
            "Men's Jewelry",
        ],
    ),
    (
        "Baby & Kids",
        &[
            "Baby Clothing",
            "Baby Gear",
            "Diapers & Feeding",
            "Toys",
            "Kids Clothing",
            "Kids Furniture",
            "Safety Products",
        ],
    ),
];

/// Hints used to rescue a near-miss category name.
pub(crate) const CATEGORY_KEYWORDS: &[(&[&str], &str)] = &[
    (&["cloth", "apparel", "fashion"], "Clothing"),
    (&["shoe", "boot", "sneaker"], "Footwear"),
    (&["makeup", "cosmetic", "skincare"], "Beauty"),
    (&["electronic", "tech", "gadget"], "Electronics"),
    (&["furniture", "decor", "kitchen"], "Home & Garden"),
    (&["sport", "fitness", "exercise"], "Sports & Outdoors"),
    (&["toy", "game", "doll"], "Toys & Games"),
    (&["book", "movie", "music"], "Books & Media"),
    (&["car", "auto", "vehicle"], "Automotive"),
    (&["health", "medical"], "Health & Personal Care"),
    (&["jewelry", "watch", "ring"], "Jewelry & Watches"),
    (&["baby", "kid", "infant"], "Baby & Kids"),
];

/// Title keywords used when the service gives nothing usable.
pub(crate) const FALLBACK_RULES: &[(&[&str], (&str, &str))] = &[
    (
        &["dress", "shirt", "pants", "jacket", "coat", "sweater", "blouse"],
        ("Clothing", "Tops"),
    ),
    (
        &["shoe", "boot", "sneaker", "sandal", "heel"],
        ("Footwear", "Casual Shoes"),
    ),
    (
        &["perfume", "cologne", "fragrance", "scent"],
        ("Beauty", "Fragrances"),
    ),
    (
        &["makeup", "lipstick", "foundation", "mascara"],
        ("Beauty", "Makeup"),
    ),
    (
        &["phone", "iphone", "samsung", "mobile"],
        ("Electronics", "Mobile Phones"),
    ),
    (
        &["laptop", "computer", "macbook", "pc"],
        ("Electronics", "Computers"),
    ),
    (&["book", "novel", "magazine"], ("Books & Media", "Books")),
    (
        &["watch", "clock", "timepiece"],
        ("Jewelry & Watches", "Watches"),
    ),
    (
        &["ring", "necklace", "bracelet", "earring"],
        ("Jewelry & Watches", "Fine Jewelry"),
    ),
    (
        &["bag", "purse", "handbag", "backpack"],
        ("Clothing", "Accessories"),
    ),
];

/// Pair used when no fallback keyword matches.
pub(crate) const DEFAULT_FALLBACK: (&str, &str) = ("Clothing", "Accessories");

/// Keyword table for the rule-based cache tier.
///
/// More specific keywords sit above the ones they contain ("headphones" before
/// "phone", "smartwatch" before "watch").
pub(crate) const STANDARD_RULES: &[(&[&str], (&str, &str))] = &[
    (&["shoe"], ("Footwear", "Casual Shoes")),
    (&["sneaker"], ("Footwear", "Athletic Shoes")),
    (&["boots"], ("Footwear", "Boots")),
    (&["headphones", "speaker", "tv"], ("Electronics", "Audio & Video")),
    (&["smartphone", "phone"], ("Electronics", "Mobile Phones")),
    (&["laptop", "tablet"], ("Electronics", "Computers")),
    (&["camera"], ("Electronics", "Cameras")),
    (&["smartwatch"], ("Electronics", "Wearables")),
    (&["watch"], ("Jewelry & Watches", "Watches")),
    (&["t-shirt", "shirt"], ("Clothing", "Tops")),
    (&["dress"], ("Clothing", "Dresses")),
    (&["jeans"], ("Clothing", "Bottoms")),
    (&["jacket", "coat"], ("Clothing", "Outerwear")),
    (&["perfume", "cologne"], ("Beauty", "Fragrances")),
    (
        &["lipstick", "mascara", "foundation", "makeup"],
        ("Beauty", "Makeup"),
    ),
    (&["shampoo"], ("Beauty", "Hair Care")),
    (&["moisturizer", "serum"], ("Beauty", "Skincare")),
];
