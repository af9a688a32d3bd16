//! Closed-form end-to-end separation densities for chains of overlapping unit spheres.
//!
//! A chain of `n` bonds holds `n + 1` spheres of unit diameter where every bonded pair
//! overlaps, so each bond vector is uniform inside the unit sphere. The density returned by
//! [`separation_probability`] is the `n`-fold convolution of that uniform bond density,
//! evaluated per unit volume at separation `r` and scaled so that its integral over
//! `0 <= r < n` is one. The radial distribution of the end-to-end distance is therefore
//! proportional to `r^2 * separation_probability(n, r)`.
//!
//! The expressions are piecewise in `r` with breaks at integer separations. Each case
//! above two bonds is divided by a normalizer held in [`FAC`].

#![allow(clippy::excessive_precision)]

use std::sync::LazyLock;
use thiserror::Error;

/// Largest bond count with a tabulated density.
pub const MAX_BONDS: usize = 10;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SeparationError {
    #[error("Separation density is tabulated for 1 to {max} bonds, got {0}", max = MAX_BONDS)]
    UnsupportedBondCount(usize),
}

fn acoth(x: f64) -> f64 {
    0.5 * ((x + 1.0) / (x - 1.0)).ln()
}

static FAC: LazyLock<[f64; MAX_BONDS + 1]> = LazyLock::new(|| {
    let mut fac = [1.0; MAX_BONDS + 1];
    fac[3] = 9.0 * (-92.0 + 27.0 * 3.0f64.ln());
    fac[4] = 4608.0 * (-179.0 + 256.0 * acoth(3.0));
    fac[5] = 90.0 * (-2773712.0 + 6640625.0 * acoth(4.0) + 3727.0 * 3.0f64.ln());
    fac[6] = -8847360.0 * (-270257.0 + 905418.0 * acoth(5.0) + 6245.0 * 2.0f64.ln());
    fac[7] = -315.0
        * (-15825661837824.0
            + 3573372188392.0 * acoth(4.0)
            + 65635383907142.0 * acoth(6.0)
            + 12807215.0 * 3.0f64.ln());
    fac[8] = -35936796672.0
        * (-1846795758.0
            + 468503.0 * acoth(3.0)
            + 1247929879.0 * acoth(5.0)
            + 8522825728.0 * acoth(7.0));
    fac[9] = 1.0850962247457076546e23;
    fac[10] = 1.2839372233185790761e27;
    fac
});

/// Validates a bond count before it reaches [`separation_probability`].
pub fn check_bond_count(n: usize) -> Result<(), SeparationError> {
    if (1..=MAX_BONDS).contains(&n) {
        Ok(())
    } else {
        Err(SeparationError::UnsupportedBondCount(n))
    }
}

/// Normalized density of the separation `r` between the two end spheres of an `n`-bond chain.
///
/// Returns zero for `r >= n`.
///
/// # Panics
///
/// Panics when `n` is outside `1..=MAX_BONDS`. Callers validate bond counts with
/// [`check_bond_count`] when the sampler is configured.
pub fn separation_probability(n: usize, r: f64) -> f64 {
    if check_bond_count(n).is_err() {
        panic!("separation_probability called with unsupported bond count {n}");
    }
    if r >= n as f64 {
        return 0.0;
    }
    let r2 = r * r;
    match n {
        1 => 1.0,
        2 => bonds_2(r),
        3 => bonds_3(r, r2),
        4 => bonds_4(r, r2),
        5 => bonds_5(r, r2),
        6 => bonds_6(r, r2),
        7 => bonds_7(r, r2),
        8 => bonds_8(r, r2),
        9 => bonds_9(r, r2),
        _ => bonds_10(r, r2),
    }
}

fn bonds_2(r: f64) -> f64 {
    let rm2 = r - 2.0;
    rm2 * rm2 * (4.0 + r) / 12.0
}

fn bonds_3(r: f64, r2: f64) -> f64 {
    if r < 1.0 {
        return (-525.0 + (315.0 - (63.0 - r2) * r2) * r2) / FAC[3];
    }
    let rm3 = r - 3.0;
    let rm32 = rm3 * rm3;
    -rm32 * rm32 * (-6.0 + (27.0 + (12.0 + r) * r) * r) / (2.0 * r * FAC[3])
}

fn bonds_4(r: f64, r2: f64) -> f64 {
    if r < 2.0 {
        return (-348160.0
            + r2 * (184320.0
                + r2 * (-56448.0 + r * (15120.0 + 960.0 * r + r2 * (-540.0 + 3.0 * r2)))))
            / FAC[4];
    }
    let rm4 = r - 4.0;
    let rm43 = rm4 * rm4 * rm4;
    -(rm43 * rm43 * (-144.0 + r * (224.0 + r * (156.0 + r * (24.0 + r))))) / (FAC[4] * r)
}

fn bonds_5(r: f64, r2: f64) -> f64 {
    if r < 1.0 {
        return -(146392675.0
            + r2 * (-63050130.0
                + r2 * (12657645.0
                    + r2 * (-1501500.0 + r2 * (96525.0 + r2 * (-1170.0 + r2 * 3.0))))))
            / (2.0 * FAC[5]);
    }
    if r < 3.0 {
        let rm3 = r - 3.0;
        let rm32 = rm3 * rm3;
        return (-11.645519426547745417 + rm3)
            * (2.9955737735903254375 + rm3)
            * (8.699501424572235734 + rm3)
            * (13.97637523661338622 + rm3)
            * (21.342480273228225428 + rm3)
            * (0.7342909491741547658 - 1.667110360558664731 * rm3 + rm32)
            * (1.0303848213615477176 - 1.5307636570742344459 * rm3 + rm32)
            * (2.3897772117330571797 - 0.8886883892789973696 * rm3 + rm32)
            * (15.643325581592968058 + 7.7181511254554691437 * rm3 + rm32)
            / (r * FAC[5]);
    }
    let rm5 = r - 5.0;
    let rm52 = rm5 * rm5;
    let rm54 = rm52 * rm52;
    -rm54
        * rm54
        * (-0.7806915955741175188 + r)
        * (2.5006342896385876075 + r)
        * (6.6436016161512016326 + r)
        * (12.038860037830168394 + r)
        * (19.597595651954159885 + r)
        / (4.0 * r * FAC[5])
}

fn bonds_6(r: f64, r2: f64) -> f64 {
    if r < 2.0 {
        return 10.0
            * (-20.663272399445758108 + r)
            * (-12.670131734239847386 + r)
            * (8.5812267463490890752 + r)
            * (14.483969838752005272 + r)
            * (22.472894082217685734 + r)
            * (12.627138033294569079 - 7.0774518544647587239 * r + r2)
            * (12.791198774472720108 - 6.8418369699588631093 * r + r2)
            * (13.72421926822998938 - 6.1151889532396643285 * r + r2)
            * (6.706456116575184131 + 3.6433022025736211298 * r + r2)
            * (4.6778892336765258878 + 4.1864890414564904446 * r + r2)
            / FAC[6];
    }
    if r < 4.0 {
        let rm4 = r - 4.0;
        let rm42 = rm4 * rm4;
        return -5.0
            * (-14.155802106465130133 + rm4)
            * (3.9243026987024033091 + rm4)
            * (9.1490819706794762747 + rm4)
            * (13.88047597753425173 + rm4)
            * (19.812004333376225671 + rm4)
            * (27.940400019553254824 + rm4)
            * (0.7636120659947073487 - 1.7189254501991924474 * rm4 + rm42)
            * (0.9408278613331036471 - 1.6531001375241852783 * rm4 + rm42)
            * (1.5061280567943069866 - 1.4416077757701893518 * rm4 + rm42)
            * (3.7569261240788530062 - 0.5759377102201528465 * rm4 + rm42)
            * (20.816947688202424179 + 8.8391081803332382487 * rm4 + rm42)
            / (r * FAC[6]);
    }
    let rm6 = r - 6.0;
    let rm62 = rm6 * rm6;
    let rm64 = rm62 * rm62;
    rm64
        * rm64
        * rm62
        * (-1.1092620887890839184 + r)
        * (2.1435339705616727282 + r)
        * (6.0415816056834182244 + r)
        * (10.830695965418476141 + r)
        * (16.896976675134874992 + r)
        * (25.196473871990641832 + r)
        / (r * FAC[6])
}

fn bonds_7(r: f64, r2: f64) -> f64 {
    if r < 1.0 {
        let r4 = r2 * r2;
        return -10.0
            * (-704.83587167279709762 + r2)
            * (-323.57493353067866407 + r2)
            * (-132.54434423563879638 + r2)
            * (109.33047070592459752 - 20.203460280273764197 * r2 + r4)
            * (125.05528171708708364 - 15.177992581472341505 * r2 + r4)
            * (191.78332637567910347 - 0.663397699139336226 * r2 + r4)
            / FAC[7];
    }
    if r < 3.0 {
        return 7.5
            * (-24.499837185351812732 + r)
            * (-15.844913345579656722 + r)
            * (-5.0893323857263886304e-6 + r)
            * (7.877286483990656681 + r)
            * (13.136217777622784723 + r)
            * (19.559680644241281934 + r)
            * (28.211509940477606668 + r)
            * (21.151685853233686036 - 9.1828852083594505267 * r + r2)
            * (21.171939154852635151 - 9.0498104825698319163 * r + r2)
            * (21.213151779102138681 - 8.6773249347811283059 * r + r2)
            * (22.077019818148285214 - 7.754572190491953564 * r + r2)
            * (6.853422456448555975 + 2.8324263298735301241 * r + r2)
            * (3.3173879467885562645 + 3.3922272602603593643 * r + r2)
            / (r * FAC[7]);
    }
    if r < 5.0 {
        let rm5 = r - 5.0;
        let rm52 = rm5 * rm5;
        return -3.0
            * (-16.662749785120940509 + rm5)
            * (4.7346182598231468938 + rm5)
            * (9.6676685774179364482 + rm5)
            * (14.088235762311330519 + rm5)
            * (19.329584888899402107 + rm5)
            * (25.844788727614001316 + rm5)
            * (34.635638755071043307 + rm5)
            * (0.7866375529384692204 - 1.7543389558235202893 * rm5 + rm52)
            * (0.9068337796477158114 - 1.7165744412374368829 * rm5 + rm52)
            * (1.2331424606740560288 - 1.6137441143881413453 * rm5 + rm52)
            * (2.1089511465009502349 - 1.335509407147958674 * rm5 + rm52)
            * (5.4502260558993646031 - 0.2430001912868617859 * rm5 + rm52)
            * (27.11365482880402116 + 10.0253819238679988966 * rm5 + rm52)
            / (r * FAC[7]);
    }
    let rm7n = (r - 7.0) * (r - 7.0);
    let rm7n = rm7n * rm7n * rm7n;
    0.5
        * rm7n
        * rm7n
        * (-1.4534486570398939108 + r)
        * (1.7929863166426809281 + r)
        * (5.5384677768768614701 + r)
        * (9.9694148838300796512 + r)
        * (15.30793344875122891 + r)
        * (21.950316601593546361 + r)
        * (30.894329629345496591 + r)
        / (r * FAC[7])
}

fn bonds_8(r: f64, r2: f64) -> f64 {
    if r < 2.0 {
        return -35.0
            * (-30.582471610870566927 + r)
            * (-21.4908457310048427 + r)
            * (-14.484147565373872014 + r)
            * (10.662597265771953598 + r)
            * (16.408562447082325391 + r)
            * (23.288589904948409015 + r)
            * (32.426989719172574766 + r)
            * (18.439888836196970696 - 8.5599101758760078894 * r + r2)
            * (18.760761988189045438 - 8.3850301470408463685 * r + r2)
            * (19.658126102966866404 - 7.9403579767720178202 * r + r2)
            * (22.679154244994764765 - 6.9412884434867099229 * r + r2)
            * (14.463130049364862635 + 4.5184148495751038968 * r + r2)
            * (9.813570763629201288 + 5.3799012953213332193 * r + r2)
            * (8.377400849347788983 + 5.6989961685531637556 * r + r2)
            / (FAC[8]);
    }
    if r < 4.0 {
        return 21.0
            * (-28.311040615879795745 + r)
            * (-19.041628162010081697 + r)
            * (-0.0010354301873885649752 + r)
            * (7.2856078858023037761 + r)
            * (12.168420318340987233 + r)
            * (17.827697237859167396 + r)
            * (24.759841604895890736 + r)
            * (34.007679826964571043 + r)
            * (31.754303634910252779 - 11.2611575639418972502 * r + r2)
            * (31.722982965456166222 - 11.1771716842614529753 * r + r2)
            * (31.640203208039229256 - 10.9652290087249278884 * r + r2)
            * (31.383714649410244196 - 10.4723942696851196555 * r + r2)
            * (32.018573532669754486 - 9.3686787745505957835 * r + r2)
            * (7.517238032382953375 + 2.0104551189211066296 * r + r2)
            * (2.2414089287174718245 + 2.5386335164572327466 * r + r2)
            / (FAC[8] * r);
    }
    if r < 6.0 {
        let rm6 = r - 6.0;
        let rm62 = rm6 * rm6;
        return -7.0
            * (-19.167762398755254177 + rm6)
            * (5.4699074502141796531 + rm6)
            * (10.221511396855285446 + rm6)
            * (14.445389836354267471 + rm6)
            * (19.27349980745107378 + rm6)
            * (24.993150191494885028 + rm6)
            * (32.026278513792358258 + rm6)
            * (41.40543904812347119 + rm6)
            * (0.805189915394450896 - 1.7805440363273398668 * rm6 + rm62)
            * (0.8928448055378504483 - 1.7565486615630626029 * rm6 + rm62)
            * (1.110713842408393392 - 1.696817723289354033 * rm6 + rm62)
            * (1.5963919045924004093 - 1.5632022394127791114 * rm6 + rm62)
            * (2.8355860775799921747 - 1.2193665640844762326 * rm6 + rm62)
            * (7.466622130539541303 + 0.1041858474042261884 * rm6 + rm62)
            * (34.399377457727163683 + 11.2448795317425190091 * rm6 + rm62)
            / (FAC[8] * r);
    }
    let rm8 = r - 8.0;
    let rm814 = rm8 * rm8;
    let rm814 = rm814 * rm814 * rm814 * rm8;
    let rm814 = rm814 * rm814;
    rm814
        * (6.1906986749463368728 + rm8)
        * (9.4433989805794742917 + rm8)
        * (13.087904646691476115 + rm8)
        * (17.28304422447324228 + rm8)
        * (22.179670619491430171 + rm8)
        * (27.998841449141393342 + rm8)
        * (35.149253935946578148 + rm8)
        * (44.667187468730068781 + rm8)
        / (FAC[8] * r)
}

fn bonds_9(r: f64, r2: f64) -> f64 {
    if r < 1.0 {
        let r4 = r2 * r2;
        return 70.0
            * (-1339.3818732572790373 + r2)
            * (-729.14612203399050417 + r2)
            * (-387.88675827067060694 + r2)
            * (-182.06453197357443423 + r2)
            * (247.85684584958031176 - 30.775584314506662372 * r2 + r4)
            * (271.64253396599716354 - 26.122580680557891357 * r2 + r4)
            * (339.79046405460486136 - 14.816743387077397169 * r2 + r4)
            * (567.95216483585341562 + 10.194193917656533542 * r2 + r4)
            / FAC[9];
    }
    if r < 3.0 {
        return -56.0
            * (-34.582311920734983338 + r)
            * (-24.992661957284416945 + r)
            * (-17.488028192734710061 + r)
            * (-1.383150155092837703e-9 + r)
            * (9.9641140191887944306 + r)
            * (15.275628751504522331 + r)
            * (21.325806539922672215 + r)
            * (28.648730386050029958 + r)
            * (38.325425823332099091 + r)
            * (28.562622189135126569 - 10.6719123338422403573 * r + r2)
            * (28.70507115906184515 - 10.5541760339839146887 * r + r2)
            * (29.05913903831001745 - 10.2731288535746689505 * r + r2)
            * (29.910351008219846128 - 9.6992281634742121841 * r + r2)
            * (33.109435948561163527 - 8.5253445394662507222 * r + r2)
            * (15.602088411365139391 + 3.6984662028815353093 * r + r2)
            * (8.74429031620716939 + 4.6043633640202096921 * r + r2)
            * (6.459782693551278648 + 4.944256909578684375 * r + r2)
            / (r * FAC[9]);
    }
    if r < 5.0 {
        return 28.0
            * (-32.102003289043321523 + r)
            * (-22.256513774013999868 + r)
            * (-0.019481535609513795422 + r)
            * (6.7554337530156031483 + r)
            * (11.394577631317107669 + r)
            * (16.590631798368255241 + r)
            * (22.666886952847596752 + r)
            * (30.066339108752666659 + r)
            * (39.853988094659807539 + r)
            * (44.413272765229737826 - 13.3228573032607344464 * r + r2)
            * (44.361461572930625046 - 13.2657621038680272 * r + r2)
            * (44.237151355715103365 - 13.1303141049877793058 * r + r2)
            * (43.97780832824351715 - 12.8542250410841235126 * r + r2)
            * (43.25042168424317674 - 12.2421269588397814766 * r + r2)
            * (43.510305515279639999 - 10.9664711379826025195 * r + r2)
            * (8.706003701431280234 + 1.1855700035587559181 * r + r2)
            * (1.5885655973358157054 + 1.646327906170090721 * r + r2)
            / (r * FAC[9]);
    }
    if r < 7.0 {
        let rm7 = r - 7.0;
        let rm72 = rm7 * rm7;
        return -8.0
            * (-21.671551106850203861 + rm7)
            * (6.1658351104757744729 + rm7)
            * (10.795082806936117749 + rm7)
            * (14.886690765689426014 + rm7)
            * (19.439779413793422907 + rm7)
            * (24.671973885987940333 + rm7)
            * (30.82512647015834664 + rm7)
            * (38.323916055253040191 + rm7)
            * (48.234343836705240945 + rm7)
            * (0.8204755636440703225 - 1.8009337679297521787 * rm7 + rm72)
            * (0.8875491280110375689 - 1.7846057971090110034 * rm7 + rm72)
            * (1.045466534148576728 - 1.7461307819268706488 * rm7 + rm72)
            * (1.3620925810392051405 - 1.6688498854814113808 * rm7 + rm72)
            * (2.0261760129867730361 - 1.5061616285750895082 * rm7 + rm72)
            * (3.6849852800828341851 - 1.0961867085438506639 * rm7 + rm72)
            * (9.802984897298482732 + 0.4622105022694643882 * rm7 + rm72)
            * (42.534612957672133683 + 12.4694608291474156047 * rm7 + rm72)
            / (r * FAC[9]);
    }
    let rm9 = r - 9.0;
    let rm9n = rm9 * rm9;
    let rm9n = rm9n * rm9n;
    let rm9n = rm9n * rm9n;
    let rm9n = rm9n * rm9n;
    rm9n
        * (6.825729439553291229 + rm9)
        * (10.092343822556426859 + rm9)
        * (13.667628739160225217 + rm9)
        * (17.697176468096202415 + rm9)
        * (22.295357761443391034 + rm9)
        * (27.60630746610677671 + rm9)
        * (33.854671868419147162 + rm9)
        * (41.461619200225694147 + rm9)
        * (51.499165234438845228 + rm9)
        / (r * FAC[9])
}

fn bonds_10(r: f64, r2: f64) -> f64 {
    if r < 2.0 {
        return 126.0
            * (-40.730861380535018703 + r)
            * (-30.704689588645562277 + r)
            * (-22.992875380046477405 + r)
            * (-16.360939093305694833 + r)
            * (12.690092798604652806 + r)
            * (18.405158447507681799 + r)
            * (24.824095152789657241 + r)
            * (32.51599265654231769 + r)
            * (42.598021872462994313 + r)
            * (25.300112484166557948 - 10.0334127425641453339 * r + r2)
            * (25.713661830911233875 - 9.8916774102049681353 * r + r2)
            * (26.711889828809740328 - 9.5638283492805680772 * r + r2)
            * (28.888659834912491186 - 8.9292781791424552726 * r + r2)
            * (34.826531125934265278 - 7.6858921844156450972 * r + r2)
            * (25.542386251091209309 + 5.2925509705319046869 * r + r2)
            * (17.55329728692822335 + 6.4205917029794838437 * r + r2)
            * (14.390323965041409498 + 6.9603561206423636862 * r + r2)
            * (13.150208706289443308 + 7.1865945860794790674 * r + r2)
            / FAC[10];
    }
    if r < 4.0 {
        return -84.0
            * (-38.554086424835663099 + r)
            * (-28.493977199105514103 + r)
            * (-20.519100496194077693 + r)
            * (-2.8435598074623484647e-6 + r)
            * (9.3518533371588264352 + r)
            * (14.376666106461544584 + r)
            * (19.918636225956956607 + r)
            * (26.3312575146666767 + r)
            * (34.076630980093254817 + r)
            * (44.250454721418781081 + r)
            * (40.792020913412716658 - 12.76277497587141496 * r + r2)
            * (40.844421107871237868 - 12.6788402943927195074 * r + r2)
            * (40.965626243924349424 - 12.4861948672875134966 * r + r2)
            * (41.210832706836601715 - 12.1196055643902069772 * r + r2)
            * (41.858439634680617615 - 11.4268079110621117711 * r + r2)
            * (45.088363178240802647 - 10.0901947966782361535 * r + r2)
            * (17.28270478888944741 + 2.8693816458246154429 * r + r2)
            * (8.03623013733705846 + 3.8075831701851841313 * r + r2)
            * (4.7572329776597928001 + 4.1491216716114254256 * r + r2)
            / (r * FAC[10]);
    }
    if r < 6.0 {
        return 36.0
            * (-35.876295340817458023 + r)
            * (-25.486721357140048453 + r)
            * (-0.11361367813780578409 + r)
            * (6.262165656228605773 + r)
            * (10.733589514338079033 + r)
            * (15.617956156305644566 + r)
            * (21.165609509853070804 + r)
            * (27.633811578402871091 + r)
            * (35.461618992852383105 + r)
            * (45.743181407742815902 + r)
            * (59.115083989577665459 - 15.373313555916510198 * r + r2)
            * (59.055745145993232657 - 15.332428121601498519 * r + r2)
            * (58.919642130832493691 - 15.239153659589212282 * r + r2)
            * (58.65974459256882318 - 15.062822611305076983 * r + r2)
            * (58.16204476708872742 - 14.728077274991556439 * r + r2)
            * (56.77789490034247689 - 13.993336943795713505 * r + r2)
            * (56.5236381230171421 - 12.552528545507928907 * r + r2)
            * (10.404553807463664483 + 0.3594811877983014611 * r + r2)
            * (1.4779285284866008174 + 0.7808770852810373599 * r + r2)
            / (r * FAC[10]);
    }
    if r < 8.0 {
        let rm8 = r - 8.0;
        let rm82 = rm8 * rm8;
        return -9.0
            * (-24.174516096409674299 + rm8)
            * (6.8386234163115958519 + rm8)
            * (11.380365980370445245 + rm8)
            * (15.379541701854251628 + rm8)
            * (19.737652581491112093 + rm8)
            * (24.638107878947582499 + rm8)
            * (30.2444382224183403 + rm8)
            * (36.792247977362783739 + rm8)
            * (44.715010116238448113 + rm8)
            * (55.111387208307203333 + rm8)
            * (0.8333065313057948019 - 1.8173616675857947139 * rm8 + rm82)
            * (0.8864369917459426455 - 1.8056861560167640538 * rm8 + rm82)
            * (1.0071149286455085158 - 1.7791532320571232352 * rm8 + rm82)
            * (1.2333222245296995433 - 1.7293665808953077083 * rm8 + rm82)
            * (1.6563519947115410641 - 1.6360801293141934015 * rm8 + rm82)
            * (2.5208398563960954861 - 1.4447080469488793034 * rm8 + rm82)
            * (4.6566996455212848487 - 0.9676064727655324345 * rm8 + rm82)
            * (12.456219501821072562 + 0.8288654241132394173 * rm8 + rm82)
            * (51.44744926980987549 + 13.688237874578266929 * rm8 + rm82)
            / (r * FAC[10]);
    }
    let rm10n = r - 10.0;
    let rm10n = rm10n * rm10n * rm10n;
    let rm10n = rm10n * rm10n * rm10n;
    let rm10n = rm10n * rm10n;
    rm10n
        * (-2.5466026413060609463 + r)
        * (0.73874700605006930547 + r)
        * (4.2657055132582012275 + r)
        * (8.1739240266672909938 + r)
        * (12.557217578288886452 + r)
        * (17.519593630574645191 + r)
        * (23.204770936312821388 + r)
        * (29.842253660028354113 + r)
        * (37.865247833846061979 + r)
        * (48.379142456279730296 + r)
        / (r * FAC[10])
}
