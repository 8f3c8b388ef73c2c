use log::info;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool_at(path: &str) -> Result<DbPool, String> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(10)
        .build(manager)
        .map_err(|e| e.to_string())?;

    // WAL for concurrent reads; FKs give brands ON DELETE SET NULL
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| e.to_string())?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), String> {
    let conn = pool.get().map_err(|e| e.to_string())?;

    conn.execute_batch(
        "
        -- Dashboard account (single admin, no roles)
        CREATE TABLE IF NOT EXISTS admin_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS brands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            logo_url TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Products reference categories by slug string, brands by id
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price REAL NOT NULL DEFAULT 0,
            category TEXT NOT NULL,
            brand_id INTEGER REFERENCES brands(id) ON DELETE SET NULL,
            image_url TEXT NOT NULL DEFAULT '',
            extra_images TEXT,
            badge TEXT NOT NULL DEFAULT '',
            badge_type TEXT,
            shopier_link TEXT NOT NULL DEFAULT '',
            trendyol_link TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            is_showcase INTEGER NOT NULL DEFAULT 0,
            showcase_order INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);
        CREATE INDEX IF NOT EXISTS idx_products_active ON products(is_active);

        CREATE TABLE IF NOT EXISTS seo_content (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS site_settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );
        ",
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

// ── Default content ─────────────────────────────────────────────────
//
// Also the hard-coded fallbacks when a stored JSON settings value fails
// to decode (see models::settings).

pub const DEFAULT_VISION_CARDS: &str = r#"[{"emoji":"🛡️","title":"Dayanıklılık","desc":"UV ve su dayanımlı malzemeler"},{"emoji":"⚡","title":"Hızlı Kargo","desc":"Sipariş sonrası aynı gün gönderim"},{"emoji":"⭐","title":"Premium Kalite","desc":"Titizlikle seçilmiş kumaşlar"},{"emoji":"💧","title":"Su Geçirmez","desc":"Yağmurda bile tam koruma"}]"#;

pub const DEFAULT_VISION_LINES: &str = r#"[{"text":"Premium malzemeler ile üst düzey dayanıklılık","color":"red"},{"text":"Her motosiklet için özel tasarım kılıflar","color":"blue"},{"text":"Otomobil tutkusu vites sweatshirtlerde","color":"red"},{"text":"Hızlı kargo & sorunsuz alışveriş","color":"blue"}]"#;

pub const DEFAULT_PRODUCT_SPECS: &str = r#"[{"icon":"🛡️","text":"UV Dayanımlı Kumaş — Solmaya karşı koruma"},{"icon":"💧","text":"Su İtici Yüzey — Yağmurda bile kuru kalır"},{"icon":"🔧","text":"Kolay Montaj — 30 saniyede takılır"},{"icon":"✨","text":"Elastik Yapı — Her seleye mükemmel uyum"}]"#;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Settings seeded on first run. Insert-if-absent: keys added in later
/// releases reach existing installations without overwriting values the
/// admin already customized.
pub fn default_settings() -> Vec<(&'static str, &'static str)> {
    vec![
        ("hero_title", "Sürüşünüze <span>Premium</span> Dokunuş"),
        (
            "hero_subtitle",
            "Özel tasarım motosiklet sele kılıfları ve vites sweatshirtleri ile farkınızı ortaya koyun.",
        ),
        ("hero_badge", "PREMIUM KALİTE"),
        (
            "about_text",
            "Utku Giyim olarak, motosiklet tutkunlarına özel, premium kalitede aksesuarlar üretiyoruz. Her ürünümüz dayanıklılık, konfor ve şıklık ön planda tutularak tasarlanmıştır.",
        ),
        ("phone", "+90 555 123 4567"),
        ("email", "info@utkugiyim.com"),
        ("address", "İstanbul, Türkiye"),
        ("instagram", "https://instagram.com/utkugiyim"),
        ("tiktok", "https://tiktok.com/@utkugiyim"),
        ("facebook", ""),
        ("whatsapp", "905551234567"),
        ("footer_text", "© 2024 Utku Giyim. Tüm hakları saklıdır."),
        ("shopier_url", "https://www.shopier.com/utkugiyim"),
        (
            "trendyol_url",
            "https://www.trendyol.com/magaza/utku-giyim-m-304694?channelId=1&sst=0",
        ),
        ("show_sele_collection", "1"),
        ("show_vites_collection", "1"),
        ("showcase_sele", "[]"),
        ("showcase_vites", "[]"),
        ("vision_cards", DEFAULT_VISION_CARDS),
        ("vision_lines", DEFAULT_VISION_LINES),
        ("product_specs", DEFAULT_PRODUCT_SPECS),
    ]
}

/// (title, slug, description, price, category, badge, badge_type)
pub fn default_products() -> Vec<(&'static str, &'static str, &'static str, f64, &'static str, &'static str, Option<&'static str>)> {
    vec![
        (
            "Klasik Siyah Sele Kılıfı",
            "klasik-siyah-sele-kilifi",
            "Su geçirmez kumaştan klasik kesim sele kılıfı. Tüm scooter ve motosiklet selelerine uyumludur.",
            249.90,
            "sele-kilifi",
            "ÇOK SATAN",
            Some("hot"),
        ),
        (
            "Kamuflaj Desenli Sele Kılıfı",
            "kamuflaj-desenli-sele-kilifi",
            "Kamuflaj desenli, UV dayanımlı sele kılıfı. Solmaya karşı korumalı kumaş.",
            279.90,
            "sele-kilifi",
            "",
            None,
        ),
        (
            "Kırmızı Şeritli Sele Kılıfı",
            "kirmizi-seritli-sele-kilifi",
            "Kırmızı şerit detaylı spor görünümlü sele kılıfı.",
            269.90,
            "sele-kilifi",
            "YENİ",
            Some("new"),
        ),
        (
            "Deri Görünümlü Sele Kılıfı",
            "deri-gorunumlu-sele-kilifi",
            "Deri dokulu premium sele kılıfı. Elastik yapısıyla her seleye tam oturur.",
            329.90,
            "sele-kilifi",
            "",
            None,
        ),
        (
            "Reflektörlü Sele Kılıfı",
            "reflektorlu-sele-kilifi",
            "Gece sürüşleri için reflektör şeritli sele kılıfı.",
            289.90,
            "sele-kilifi",
            "FIRSAT",
            Some("special"),
        ),
        (
            "GTI Vites Sweatshirt",
            "gti-vites-sweatshirt",
            "Vites körüğü desenli, üç iplik şardonlu sweatshirt.",
            449.90,
            "vites-sweatshirt",
            "ÇOK SATAN",
            Some("hot"),
        ),
        (
            "Retro Vites Sweatshirt",
            "retro-vites-sweatshirt",
            "Retro vites topuzu baskılı oversize sweatshirt.",
            429.90,
            "vites-sweatshirt",
            "",
            None,
        ),
        (
            "Drift Vites Sweatshirt",
            "drift-vites-sweatshirt",
            "Drift temalı vites sweatshirt, yüksek baskı kalitesi.",
            459.90,
            "vites-sweatshirt",
            "YENİ",
            Some("new"),
        ),
        (
            "Turbo Vites Sweatshirt",
            "turbo-vites-sweatshirt",
            "Turbo göstergesi baskılı kapüşonlu vites sweatshirt.",
            489.90,
            "vites-sweatshirt",
            "",
            None,
        ),
        (
            "Minimal Vites Sweatshirt",
            "minimal-vites-sweatshirt",
            "Minimal vites şeması baskılı, düz kesim sweatshirt.",
            419.90,
            "vites-sweatshirt",
            "",
            None,
        ),
    ]
}

/// (title, content)
pub fn default_seo_items() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Sele kılıfı hangi modellere uyar?",
            "Elastik yapısı sayesinde sele kılıflarımız scooter ve motosiklet selelerinin büyük çoğunluğuna uyum sağlar. Emin olamadığınız modeller için bize WhatsApp üzerinden yazabilirsiniz.",
        ),
        (
            "Kargo ne kadar sürede elime ulaşır?",
            "Siparişleriniz aynı gün kargoya verilir. Türkiye genelinde teslimat 1-3 iş günü sürer.",
        ),
        (
            "Ürünlerde değişim ve iade var mı?",
            "Kullanılmamış ürünlerde 14 gün içinde koşulsuz iade ve değişim hakkınız bulunur. Shopier ve Trendyol üzerinden alınan ürünlerde ilgili platformun iade süreci geçerlidir.",
        ),
    ]
}

/// Idempotent first-run seed. Safe to call on every startup: existing
/// rows are never duplicated and admin credentials are never overwritten.
pub fn seed_defaults(pool: &DbPool) -> Result<(), String> {
    let conn = pool.get().map_err(|e| e.to_string())?;

    for (key, value) in default_settings() {
        conn.execute(
            "INSERT OR IGNORE INTO site_settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
    }

    // Token-signing secret, generated once per installation
    let secret_exists: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM site_settings WHERE key = 'session_secret'",
            [],
            |row| row.get(0),
        )
        .map_err(|e| e.to_string())?;
    if secret_exists == 0 {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let bytes: [u8; 32] = rng.gen();
        conn.execute(
            "INSERT INTO site_settings (key, value) VALUES ('session_secret', ?1)",
            params![hex::encode(bytes)],
        )
        .map_err(|e| e.to_string())?;
    }

    // Admin account — only when none exists, hash stored, never plaintext
    let admin_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM admin_users", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if admin_count == 0 {
        let hash = bcrypt::hash(DEFAULT_ADMIN_PASSWORD, bcrypt::DEFAULT_COST)
            .map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO admin_users (username, password_hash) VALUES (?1, ?2)",
            params![DEFAULT_ADMIN_USERNAME, hash],
        )
        .map_err(|e| e.to_string())?;
        info!("Seeded default admin account '{}'", DEFAULT_ADMIN_USERNAME);
    }

    let brand_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM brands", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if brand_count == 0 {
        conn.execute(
            "INSERT INTO brands (name, slug, description, sort_order) VALUES (?1, ?2, ?3, 1)",
            params![
                "Utku Giyim",
                "utku-giyim",
                "Premium motosiklet aksesuarları ve vites sweatshirtleri."
            ],
        )
        .map_err(|e| e.to_string())?;
    }

    let category_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if category_count == 0 {
        conn.execute(
            "INSERT INTO categories (name, slug, description, sort_order)
             VALUES ('Sele Kılıfı', 'sele-kilifi', 'Motosiklet sele kılıfları', 1),
                    ('Vites Sweatshirt', 'vites-sweatshirt', 'Vites temalı sweatshirtler', 2)",
            [],
        )
        .map_err(|e| e.to_string())?;
    }

    let product_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if product_count == 0 {
        let default_brand_id: i64 = conn
            .query_row("SELECT id FROM brands ORDER BY id LIMIT 1", [], |row| {
                row.get(0)
            })
            .map_err(|e| e.to_string())?;
        for (i, (title, slug, description, price, category, badge, badge_type)) in
            default_products().into_iter().enumerate()
        {
            conn.execute(
                "INSERT INTO products (title, slug, description, price, category, brand_id,
                    image_url, badge, badge_type, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    title,
                    slug,
                    description,
                    price,
                    category,
                    default_brand_id,
                    format!("/images/products/{}.webp", slug),
                    badge,
                    badge_type,
                    (i % 5) as i64 + 1,
                ],
            )
            .map_err(|e| e.to_string())?;
        }
    }

    let seo_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM seo_content", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if seo_count == 0 {
        for (i, (title, content)) in default_seo_items().into_iter().enumerate() {
            conn.execute(
                "INSERT INTO seo_content (title, content, sort_order) VALUES (?1, ?2, ?3)",
                params![title, content, i as i64 + 1],
            )
            .map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}
