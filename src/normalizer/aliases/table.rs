use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::RegexSet;
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

use crate::normalizer::text::normalize_text;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AliasCategory {
    StreetType,
    RoadMarker,
    Railway,
    Residential,
    Territory,
    Settlement,
    Administrative,
    NameAdjective,
    Landform,
}

impl AliasCategory {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// (category, canonical, surface variants); the first variant is the long form.
const ALIAS_GROUPS: &[(AliasCategory, &str, &[&str])] = &[
    (AliasCategory::StreetType, "ул", &["улица", "ул.", "ул", "ул-ца", "улиц"]),
    (AliasCategory::StreetType, "пер", &["переулок", "пер.", "пер", "пер-к", "пер-к."]),
    (AliasCategory::StreetType, "пр-кт", &["проспект", "просп.", "пр-т", "пр т", "пр-кт", "пр-т.", "пр-кт.", "просп"]),
    (AliasCategory::StreetType, "б-р", &["бульвар", "бул.", "б-р", "бул", "булв"]),
    (AliasCategory::StreetType, "пр-д", &["проезд", "пр-д", "прд", "пр-зд", "пр.-д", "пр. д"]),
    (AliasCategory::StreetType, "пл", &["площадь", "пл.", "пл"]),
    (AliasCategory::StreetType, "ш", &["шоссе", "ш.", "ш", "шос.", "шс"]),
    (AliasCategory::StreetType, "наб", &["набережная", "наб.", "наб", "набр.", "набр"]),
    (AliasCategory::StreetType, "туп", &["тупик", "туп.", "туп"]),
    (AliasCategory::StreetType, "ал", &["аллея", "ал.", "алея"]),
    (AliasCategory::StreetType, "дор", &["дорога", "дор.", "дор"]),
    (AliasCategory::StreetType, "тракт", &["тракт", "тр.", "тркт", "тр-т"]),
    (AliasCategory::StreetType, "мост", &["мост"]),
    (AliasCategory::StreetType, "эст", &["эстакада", "эст.", "эст"]),
    (AliasCategory::StreetType, "п/п", &["путепровод", "путепров.", "п/п", "пп"]),
    (AliasCategory::StreetType, "съезд", &["съезд", "с/езд"]),
    (AliasCategory::StreetType, "заезд", &["заезд", "з/езд"]),
    (AliasCategory::StreetType, "подъезд-авт", &["подъезд (авто)", "подъезд авт", "подъезд авт."]),
    (AliasCategory::StreetType, "просека", &["просека", "прск", "пр-ка"]),
    (AliasCategory::StreetType, "проселок", &["проселок", "прслк", "пр-селок"]),
    (AliasCategory::StreetType, "линия", &["линия", "лин.", "лин", "линии"]),
    (AliasCategory::StreetType, "ряд", &["ряд", "ряды"]),
    (AliasCategory::StreetType, "кольцо", &["кольцо", "клц", "кольц."]),
    (AliasCategory::StreetType, "автодорога", &["автодорога", "а/д", "автод."]),
    (AliasCategory::StreetType, "трасса", &["трасса", "трс", "тр."]),

    (AliasCategory::RoadMarker, "км", &["километр", "км", "км."]),

    (AliasCategory::Railway, "ж/д ст", &[
        "железнодорожная станция", "ж/д ст", "ж/д ст.", "жд ст", "жд ст.", "ж д ст", "жд-ст",
        "ж/д станция", "жд станция", "станция",
    ]),
    (AliasCategory::Railway, "ж/д пл", &[
        "железнодорожная платформа", "ж/д пл", "ж/д пл.", "жд пл", "жд пл.", "ж д пл",
        "ж/д платформа", "жд платформа", "платформа", "платф.", "платф",
    ]),
    (AliasCategory::Railway, "ж/д рзд", &["ж/д разъезд", "ж/д рзд", "жд рзд", "жд разъезд", "разъезд", "рзд", "р/зд"]),
    (AliasCategory::Railway, "ж/д к", &["ж/д казарма", "ж/д к", "жд к", "жд казарма", "казарма"]),

    (AliasCategory::Residential, "мкр", &["микрорайон", "мкр.", "мкр", "мкрн", "м/р", "мкр-н"]),
    (AliasCategory::Residential, "кв-л", &["квартал", "кв-л", "кв-л.", "кв.", "кв"]),
    (AliasCategory::Residential, "ж/м", &["жилой массив", "жилмассив", "ж/м", "ж.м."]),
    (AliasCategory::Residential, "жр", &["жилрайон", "жил. район", "ж/р"]),

    (AliasCategory::Territory, "тер", &[
        "территория", "тер.", "тер", "тер-рия", "терр.", "тер-р.",
        "промзона", "пром. зона", "п/з", "военный городок", "в/г", "в/городок",
    ]),
    // A territory written together with its partnership form keeps both words.
    (AliasCategory::Territory, "тер снт", &["территория снт", "тер. снт"]),
    (AliasCategory::Territory, "тер днт", &["территория днт", "тер. днт"]),
    (AliasCategory::Territory, "тер днп", &["территория днп", "тер. днп"]),
    (AliasCategory::Territory, "сад-во", &["садоводство", "сад-во", "сад-во."]),
    (AliasCategory::Territory, "снт", &["садоводческое некоммерческое товарищество", "снт"]),
    (AliasCategory::Territory, "днт", &["дачное некоммерческое товарищество", "днт"]),
    (AliasCategory::Territory, "днп", &["дачное некоммерческое партнерство", "днп", "дачное партнерство"]),
    (AliasCategory::Territory, "кп", &["коттеджный поселок", "кп"]),

    (AliasCategory::Settlement, "г", &["город", "г.", "г"]),
    (AliasCategory::Settlement, "пгт", &["поселок городского типа", "пгт", "п.г.т."]),
    (AliasCategory::Settlement, "пос", &["поселок", "пос.", "пос", "п."]),
    (AliasCategory::Settlement, "рп", &["рабочий поселок", "рп"]),
    (AliasCategory::Settlement, "дп", &["дачный поселок", "дп"]),
    (AliasCategory::Settlement, "кп курортный", &["курортный поселок", "кп(курортный)", "кп курортный"]),
    (AliasCategory::Settlement, "п/ст", &["поселок при станции", "п/ст", "ппс"]),
    (AliasCategory::Settlement, "д", &["деревня", "дер.", "д.", "д"]),
    (AliasCategory::Settlement, "село", &["село", "с."]),
    (AliasCategory::Settlement, "ст-ца", &["станица", "ст-ца"]),
    (AliasCategory::Settlement, "сл", &["слобода", "сл.", "сл"]),
    (AliasCategory::Settlement, "х", &["хутор", "х.", "х"]),
    (AliasCategory::Settlement, "аул", &["аул"]),
    (AliasCategory::Settlement, "аал", &["аал"]),
    (AliasCategory::Settlement, "арбан", &["арбан", "арб"]),
    (AliasCategory::Settlement, "улус", &["улус"]),
    (AliasCategory::Settlement, "починок", &["починок", "поч.", "пчк"]),
    (AliasCategory::Settlement, "кордон", &["кордон"]),
    (AliasCategory::Settlement, "заимка", &["заимка"]),
    (AliasCategory::Settlement, "зимовье", &["зимовье"]),
    (AliasCategory::Settlement, "кишлак", &["кишлак"]),
    (AliasCategory::Settlement, "юрты", &["юрты"]),

    (AliasCategory::Administrative, "р-н", &["район", "р-н", "рн", "р-он"]),
    (AliasCategory::Administrative, "м/о", &["муниципальный округ", "м/о", "м.о."]),
    (AliasCategory::Administrative, "вн/тер-г", &[
        "внутригородская территория", "вн/тер-г", "вн.тер.г", "внутригородская территория г.",
    ]),
    (AliasCategory::Administrative, "мр", &["муниципальный район", "м-р", "мр", "муниц. район"]),
    (AliasCategory::Administrative, "го", &["городской округ", "г.о.", "го", "гор. округ"]),
    (AliasCategory::Administrative, "с/п", &["сельское поселение", "с/п", "с.п."]),
    (AliasCategory::Administrative, "с/пос", &["с/пос", "с.пос.", "с пос"]),
    (AliasCategory::Administrative, "г/п", &["городское поселение", "г/п", "г.п."]),
    (AliasCategory::Administrative, "гп", &["городской поселок", "гп"]),
    (AliasCategory::Administrative, "п/с", &["поселение", "п/с", "п.с."]),
    (AliasCategory::Administrative, "с/с", &["сельсовет", "с/с", "с.с.", "сельский совет"]),
    (AliasCategory::Administrative, "с/о", &["сельский округ", "с/о", "с.о."]),
    (AliasCategory::Administrative, "обл", &["область", "обл.", "обл"]),
    (AliasCategory::Administrative, "край", &["край", "кр.", "край."]),
    (AliasCategory::Administrative, "респ", &["республика", "респ.", "респ"]),
    (AliasCategory::Administrative, "ао", &["автономный округ", "авт. округ", "ао"]),
    (AliasCategory::Administrative, "аобл", &["автономная область", "аобл", "а.обл"]),

    (AliasCategory::NameAdjective, "большая", &["большая", "б", "больш"]),
    (AliasCategory::NameAdjective, "малая", &["малая", "м.", "м", "мал.", "мал"]),
    (AliasCategory::NameAdjective, "средняя", &["средняя", "ср.", "ср", "сред.", "сред"]),
    (AliasCategory::NameAdjective, "новая", &["новая", "н.", "н", "нов.", "нов"]),
    (AliasCategory::NameAdjective, "старая", &["старая", "ст.", "ст", "стар.", "стар"]),
    (AliasCategory::NameAdjective, "верхняя", &["верхняя", "в.", "в", "верх.", "верх"]),
    (AliasCategory::NameAdjective, "нижняя", &["нижняя", "ниж.", "ниж", "нижн.", "нижн"]),
    (AliasCategory::NameAdjective, "восточная", &["восточная", "вост.", "вост", "восточн.", "восточн"]),
    (AliasCategory::NameAdjective, "западная", &["западная", "зап.", "зап", "западн.", "западн"]),
    (AliasCategory::NameAdjective, "северная", &["северная", "сев.", "сев", "северн.", "северн"]),
    (AliasCategory::NameAdjective, "южная", &["южная", "юж.", "юж", "южн.", "южн"]),
    (AliasCategory::NameAdjective, "центральная", &["центральная", "центр.", "центр", "централь.", "централь"]),
    (AliasCategory::NameAdjective, "промышленная", &["промышленная", "пром.", "пром", "промышл.", "промышл"]),
    (AliasCategory::NameAdjective, "строительная", &["строительная", "стр.", "строит.", "строит"]),
    (AliasCategory::NameAdjective, "железнодорожная", &["железнодорожная", "жд", "ж.д.", "ж/д", "железнодор."]),
    (AliasCategory::NameAdjective, "красная", &["красная", "кр.", "кр", "красн.", "красн"]),
    (AliasCategory::NameAdjective, "советская", &["советская", "сов.", "сов", "совет.", "совет"]),
    (AliasCategory::NameAdjective, "комсомольская", &["комсомольская", "комс.", "комс", "комсом.", "комсом"]),
    (AliasCategory::NameAdjective, "пионерская", &["пионерская", "пион.", "пион", "пионер.", "пионер"]),
    (AliasCategory::NameAdjective, "октябрьская", &["октябрьская", "окт.", "окт", "октябр.", "октябр"]),
    (AliasCategory::NameAdjective, "молодежная", &["молодежная", "мол.", "мол", "молод.", "молод"]),
    (AliasCategory::NameAdjective, "школьная", &["школьная", "шк.", "шк", "школ.", "школ"]),

    (AliasCategory::Landform, "остров", &["остров", "о-в", "о-в."]),
    (AliasCategory::Landform, "полуостров", &["полуостров", "п-ов"]),
    (AliasCategory::Landform, "берег", &["берег", "брг"]),
    (AliasCategory::Landform, "мыс", &["мыс"]),
    (AliasCategory::Landform, "урочище", &["урочище", "ур."]),
];

// Short forms the registry stores for adjective prefixes of street names.
const ADJECTIVE_SHORT_FORMS: &[(&str, &[&str])] = &[
    ("большая", &["б"]),
    ("малая", &["м"]),
    ("средняя", &["ср", "с"]),
    ("новая", &["н"]),
    ("старая", &["ст"]),
    ("верхняя", &["в"]),
    ("нижняя", &["ниж"]),
    ("восточная", &["вост"]),
    ("западная", &["зап"]),
    ("северная", &["сев"]),
    ("южная", &["юж"]),
    ("центральная", &["центр"]),
    ("промышленная", &["пром"]),
    ("строительная", &["стр"]),
    ("железнодорожная", &["жд", "ж.д"]),
    ("красная", &["кр"]),
    ("советская", &["сов"]),
    ("комсомольская", &["комс"]),
    ("пионерская", &["пион"]),
    ("октябрьская", &["окт"]),
    ("молодежная", &["мол"]),
    ("школьная", &["шк"]),
];

// Pinned canonicals are tried before every other candidate of their pass.
const STREET_PINS: &[&str] = &["б-р"];
const OTHER_PINS: &[&str] = &["средняя", "с/пос"];


#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub surface: String,
    pub parts: Vec<String>,
    pub canonical: &'static str,
    pub category: AliasCategory,
}

impl AliasEntry {
    pub fn token_count(&self) -> usize {
        self.parts.len()
    }

    pub fn is_street_type(&self) -> bool {
        self.category == AliasCategory::StreetType
    }
}


/// Ordered regex rules; the first matching pattern decides the canonical.
#[derive(Debug)]
pub struct RuleSet {
    patterns: RegexSet,
    canonicals: Vec<&'static str>,
}

impl RuleSet {
    fn new(rules: &[(&str, &'static str)]) -> Self {
        let patterns = RegexSet::new(rules.iter().map(|(p, _)| p.replace("{RW}", RAILWAY_PREFIX)))
            .expect("valid alias rules");
        Self {
            patterns,
            canonicals: rules.iter().map(|(_, c)| *c).collect(),
        }
    }

    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.patterns.matches(text).iter().next().map(|idx| self.canonicals[idx])
    }

    pub fn len(&self) -> usize {
        self.canonicals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonicals.is_empty()
    }
}


// Precomputed candidates of one category class (street types or everything else).
#[derive(Debug, Default)]
struct PassIndex {
    multi: Vec<usize>,
    single: HashMap<String, usize>,
}


/// Read-only synonym table shared by every request.
#[derive(Debug)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
    by_canonical: HashMap<&'static str, AliasCategory>,
    long_forms: HashMap<&'static str, String>,
    street_surfaces: HashSet<String>,
    street_canonicals: Vec<&'static str>,
    street_pass: PassIndex,
    other_pass: PassIndex,
    phrase_rules: RuleSet,
    token_rules: RuleSet,
}

lazy_static! {
    static ref STANDARD_TABLE: AliasTable = AliasTable::build();
}

impl AliasTable {

    pub fn standard() -> &'static AliasTable {
        &STANDARD_TABLE
    }

    fn build() -> Self {
        let mut entries = Vec::new();
        let mut by_canonical = HashMap::new();
        let mut long_forms = HashMap::new();
        let mut street_surfaces = HashSet::new();
        let mut street_canonicals = Vec::new();

        for (category, canonical, variants) in ALIAS_GROUPS {
            by_canonical.insert(*canonical, *category);
            if *category == AliasCategory::StreetType {
                street_canonicals.push(*canonical);
            }

            let mut seen = HashSet::new();
            // The canonical always resolves to itself.
            for raw in variants.iter().chain(std::iter::once(canonical)) {
                let surface = normalize_text(raw);
                if surface.is_empty() || !seen.insert(surface.clone()) {
                    continue;
                }
                if !long_forms.contains_key(canonical) {
                    long_forms.insert(*canonical, surface.clone());
                }
                if *category == AliasCategory::StreetType {
                    street_surfaces.insert(surface.clone());
                }
                entries.push(AliasEntry {
                    parts: surface.split_whitespace().map(str::to_string).collect(),
                    surface,
                    canonical: *canonical,
                    category: *category,
                });
            }
        }

        let mut table = Self {
            entries,
            by_canonical,
            long_forms,
            street_surfaces,
            street_canonicals,
            street_pass: PassIndex::default(),
            other_pass: PassIndex::default(),
            phrase_rules: RuleSet::new(PHRASE_RULES),
            token_rules: RuleSet::new(TOKEN_RULES),
        };
        table.street_pass = table.pass_index(true);
        table.other_pass = table.pass_index(false);
        table
    }

    fn pass_index(&self, street: bool) -> PassIndex {
        let mut single = HashMap::new();
        for idx in self.ordered_indices(street, false) {
            single.entry(self.entries[idx].surface.clone()).or_insert(idx);
        }
        PassIndex {
            multi: self.ordered_indices(street, true),
            single,
        }
    }


    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Candidates of one resolution pass, pinned canonicals first, then longest surface first.
    pub fn ordered_candidates(&self, street: bool, multi_token: bool) -> Vec<&AliasEntry> {
        self.ordered_indices(street, multi_token)
            .into_iter()
            .map(|idx| &self.entries[idx])
            .collect()
    }

    fn ordered_indices(&self, street: bool, multi_token: bool) -> Vec<usize> {
        let pins = if street { STREET_PINS } else { OTHER_PINS };
        let mut indices: Vec<usize> = (0..self.entries.len())
            .filter(|&idx| self.entries[idx].is_street_type() == street)
            .filter(|&idx| (self.entries[idx].token_count() > 1) == multi_token)
            .collect();

        indices.sort_by_key(|&idx| {
            let entry = &self.entries[idx];
            let pin = pins.iter().position(|p| *p == entry.canonical).unwrap_or(pins.len());
            (pin, std::cmp::Reverse(entry.surface.chars().count()))
        });
        indices
    }

    pub fn multi_token_entries(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter().filter(|e| e.token_count() > 1)
    }

    /// Multi-token candidates of a pass in the order they are tried.
    pub fn multi_token_pass(&self, street: bool) -> impl Iterator<Item = &AliasEntry> {
        let pass = if street { &self.street_pass } else { &self.other_pass };
        pass.multi.iter().map(|&idx| &self.entries[idx])
    }

    /// The winning single-token alias for `token` within a pass.
    pub fn single_token_alias(&self, street: bool, token: &str) -> Option<&AliasEntry> {
        let pass = if street { &self.street_pass } else { &self.other_pass };
        pass.single.get(token).map(|&idx| &self.entries[idx])
    }

    pub fn phrase_rules(&self) -> &RuleSet {
        &self.phrase_rules
    }

    pub fn token_rules(&self) -> &RuleSet {
        &self.token_rules
    }

    pub fn category_of(&self, canonical: &str) -> Option<AliasCategory> {
        self.by_canonical.get(canonical).copied()
    }

    /// True for canonical street types and every surface variant of one.
    pub fn is_street_type(&self, token: &str) -> bool {
        self.street_surfaces.contains(token)
    }

    pub fn is_street_canonical(&self, token: &str) -> bool {
        self.street_canonicals.contains(&token)
    }

    pub fn street_canonicals(&self) -> &[&'static str] {
        &self.street_canonicals
    }

    pub fn is_settlement_type(&self, token: &str) -> bool {
        matches!(
            self.category_of(token),
            Some(AliasCategory::Settlement) | Some(AliasCategory::Territory)
        )
    }

    pub fn is_administrative(&self, token: &str) -> bool {
        self.category_of(token) == Some(AliasCategory::Administrative)
    }

    /// Any canonical type token: street, settlement, territory, administrative unit.
    pub fn is_type_token(&self, token: &str) -> bool {
        matches!(self.category_of(token), Some(c) if c != AliasCategory::NameAdjective && c != AliasCategory::Landform)
    }

    /// Full word for a canonical abbreviation, e.g. `пр-кт` → `проспект`.
    pub fn long_form(&self, canonical: &str) -> Option<&str> {
        self.long_forms.get(canonical).map(|s| s.as_str())
    }

    /// Regex alternation of street-type surfaces, longest first, for embedding in patterns.
    pub fn street_type_alternation(&self) -> String {
        let mut surfaces: Vec<&String> = self.street_surfaces.iter().collect();
        surfaces.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        surfaces
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn adjective_short_forms(&self, long: &str) -> Option<&'static [&'static str]> {
        ADJECTIVE_SHORT_FORMS
            .iter()
            .find(|(l, _)| *l == long)
            .map(|(_, shorts)| *shorts)
    }

    pub fn adjective_long_form(&self, short: &str) -> Option<&'static str> {
        ADJECTIVE_SHORT_FORMS
            .iter()
            .find(|(_, shorts)| shorts.contains(&short))
            .map(|(long, _)| *long)
    }

    pub fn is_name_adjective(&self, token: &str) -> bool {
        ADJECTIVE_SHORT_FORMS.iter().any(|(long, _)| *long == token)
    }
}

const RAILWAY_PREFIX: &str = r"(?:ж[/\s]?д|железнодорожн\w*)\s*";

const PHRASE_RULES: &[(&str, &str)] = &[
    (r"^{RW}станц(?:ия|ии|и)?$", "ж/д ст"),
    (r"^{RW}платформ(?:а|ы)?$", "ж/д пл"),
    (r"^{RW}разъезд$", "ж/д рзд"),
    (r"^{RW}казарм(?:а|ы)?$", "ж/д к"),
    (r"^муниципальн(?:ый|ая)\s+округ$", "м/о"),
];

// Compound abbreviations require a separator so their canonical forms stay fixed points.
const TOKEN_RULES: &[(&str, &str)] = &[
    (r"^м[./]о$", "м/о"),
    (r"^вн[./]?тер[.-]?г$", "вн/тер-г"),
    (r"^с[./]п$", "с/п"),
    (r"^с[./]пос$", "с/пос"),
    (r"^г[./]п$", "г/п"),
    (r"^п[./]с$", "п/с"),
    (r"^с[./]с$", "с/с"),
    (r"^с[./]о$", "с/о"),
    (r"^б$", "большая"),
    (r"^м$", "малая"),
    (r"^н$", "новая"),
    (r"^ст$", "старая"),
    (r"^с$", "средняя"),
    (r"^станц(?:ия|ии|и)?$", "ж/д ст"),
    (r"^платформ(?:а|ы)?$", "ж/д пл"),
    (r"^разъезд$", "ж/д рзд"),
];
