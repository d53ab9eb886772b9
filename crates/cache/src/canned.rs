//! Built-in answer tables for the quick-answer layer.
//!
//! Questions are stored already normalized (see [`crate::normalize`]).
//! Order matters: keyword and similarity scans walk the tables front to
//! back and stop at the first match.

const CAPABILITIES: &str = "אני יכול לעזור לך בניהול חנות ה-WooCommerce שלך במגוון דרכים:\n\n\
1. הצגת מידע על מוצרים, קטגוריות והזמנות\n\
2. יצירת מוצרים חדשים\n\
3. עדכון מוצרים קיימים\n\
4. מחיקת מוצרים\n\
5. ניהול הזמנות\n\n\
איך אוכל לעזור לך היום?";

/// Exact-match canned answers.
pub const CANNED_ANSWERS: &[(&str, &str)] = &[
    // greetings
    ("היי", "היי! איך אני יכול לעזור לך עם חנות ה-WooCommerce שלך היום?"),
    ("שלום", "שלום! במה אוכל לסייע לך בניהול החנות?"),
    ("הי", "היי! איך אוכל לעזור לך היום עם החנות?"),
    ("מה שלומך", "אני מצוין, תודה ששאלת! איך אוכל לעזור לך עם החנות היום?"),
    ("בוקר טוב", "בוקר טוב! איך אוכל לעזור לך בניהול החנות היום?"),
    ("ערב טוב", "ערב טוב! במה אוכל לסייע לך בחנות?"),
    ("לילה טוב", "לילה טוב! אשמח לעזור לך שוב מחר."),
    ("תודה", "בשמחה! אם תצטרך עזרה נוספת, אני כאן."),
    ("ביי", "להתראות! אשמח לעזור לך שוב בפעם הבאה."),
    ("להתראות", "להתראות! אשמח לעזור לך שוב בקרוב."),
    // capabilities
    ("מה אתה יכול לעשות", CAPABILITIES),
    ("מה אתה יודע לעשות", CAPABILITIES),
    ("איך אתה יכול לעזור לי", CAPABILITIES),
    (
        "מה אתה עושה",
        "אני עוזר בניהול חנות ה-WooCommerce שלך. אני יכול להציג מידע על מוצרים, קטגוריות והזמנות, ליצור ולעדכן מוצרים, ולסייע בניהול ההזמנות. במה אוכל לעזור לך?",
    ),
    (
        "מה התפקיד שלך",
        "התפקיד שלי הוא לעזור לך בניהול חנות ה-WooCommerce שלך באמצעות ממשק צ'אט פשוט. אני יכול לבצע פעולות שונות בחנות ולספק לך מידע מהיר ומדויק. במה אוכל לעזור לך היום?",
    ),
    // products
    (
        "איך אני מוסיף מוצר",
        "כדי להוסיף מוצר חדש, אתה יכול לכתוב לי משהו כמו: 'צור מוצר חדש בשם X במחיר Y עם התיאור Z'. אני אדאג ליצור את המוצר עבורך בחנות.",
    ),
    (
        "איך אני מעדכן מוצר",
        "כדי לעדכן מוצר קיים, אתה יכול לכתוב לי משהו כמו: 'עדכן את המוצר X ושנה את המחיר ל-Y' או 'שנה את התיאור של המוצר X ל-Z'. אני אדאג לעדכן את המוצר עבורך.",
    ),
    (
        "איך אני מוחק מוצר",
        "כדי למחוק מוצר, אתה יכול לכתוב לי משהו כמו: 'מחק את המוצר X'. אני אדאג למחוק את המוצר מהחנות לאחר שאוודא שזה המוצר הנכון.",
    ),
    // orders
    (
        "איך אני בודק הזמנות",
        "כדי לבדוק הזמנות, אתה יכול לשאול אותי 'הצג את ההזמנות האחרונות' או 'מה סטטוס ההזמנה מספר X'. אני אציג לך את המידע הרלוונטי מהחנות.",
    ),
];

/// Substring triggers.
pub const KEYWORD_ANSWERS: &[(&str, &str)] = &[
    ("יכולות", CAPABILITIES),
    (
        "עזרה",
        "אני כאן כדי לעזור לך בניהול חנות ה-WooCommerce שלך. אני יכול להציג מידע על מוצרים, קטגוריות והזמנות, ליצור ולעדכן מוצרים, ולסייע בניהול ההזמנות. במה אוכל לעזור לך?",
    ),
    (
        "אפשרויות",
        "הנה האפשרויות העיקריות שאני מציע:\n\n\
1. הצגת מידע על מוצרים, קטגוריות והזמנות\n\
2. יצירת מוצרים חדשים\n\
3. עדכון מוצרים קיימים\n\
4. מחיקת מוצרים\n\
5. ניהול הזמנות\n\n\
איך אוכל לעזור לך היום?",
    ),
    (
        "פקודות",
        "אני מבין פקודות טבעיות בעברית. למשל:\n\
- 'הצג את כל המוצרים'\n\
- 'צור מוצר חדש בשם X'\n\
- 'עדכן את המוצר Y'\n\
- 'מחק את המוצר Z'\n\
- 'הצג את ההזמנות האחרונות'\n\n\
איך אוכל לעזור לך היום?",
    ),
    (
        "מה אתה",
        "אני עוזר וירטואלי המתמחה בניהול חנויות WooCommerce. אני יכול לעזור לך לנהל את המוצרים, הקטגוריות וההזמנות בחנות שלך באמצעות שיחה פשוטה בעברית. במה אוכל לעזור לך היום?",
    ),
];

/// Messages containing any of these are "general questions": the agent's
/// answer to them is worth remembering.
pub const GENERAL_QUESTION_KEYWORDS: &[&str] =
    &["מה אתה", "יכול", "עושה", "עזרה", "אפשרויות", "פקודות"];
